//! Askama template definitions for the built-in fragments.

use askama::Template;

/// A titled link in a list
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEntry {
    pub title: String,
    pub url: String,
}

impl LinkEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A card on the landing page
#[derive(Debug, Clone)]
pub struct LandingCard {
    pub title: String,
    pub url: String,
    /// Button text ("Open Section" or "Read")
    pub label: String,
}

/// Body of a section index page; wrapped in the user template afterwards
#[derive(Template)]
#[template(path = "section_index.html")]
pub struct SectionIndexTemplate {
    pub subsections: Vec<LinkEntry>,
    pub pages: Vec<LinkEntry>,
}

/// Trail of links from the landing page down to the current page
#[derive(Template)]
#[template(path = "breadcrumb.html")]
pub struct BreadcrumbTemplate {
    pub crumbs: Vec<LinkEntry>,
    pub current: String,
}

/// Landing page written next to the assets folder
#[derive(Template)]
#[template(path = "landing.html")]
pub struct LandingTemplate {
    pub site_title: String,
    pub tagline: String,
    pub stylesheet_url: String,
    /// Pre-rendered sidebar navigation
    pub sidebar_html: String,
    pub cards: Vec<LandingCard>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_index_lists() {
        let html = SectionIndexTemplate {
            subsections: vec![LinkEntry::new("Advanced", "/pages/topics/advanced/index.html")],
            pages: vec![LinkEntry::new("Algebra & Co", "/pages/topics/algebra.html")],
        }
        .render()
        .unwrap();

        assert!(html.starts_with("<h2>Subsections</h2>"));
        assert!(html.contains(r#"<li><a href="/pages/topics/advanced/index.html">Advanced</a></li>"#));
        assert!(html.contains("</ul>\n<hr>\n<h2>Pages</h2>"));
        assert!(html.contains(">Algebra &"));
        assert!(!html.contains("Algebra & Co"));
    }

    #[test]
    fn test_section_index_pages_only() {
        let html = SectionIndexTemplate {
            subsections: vec![],
            pages: vec![LinkEntry::new("Algebra", "/a.html")],
        }
        .render()
        .unwrap();
        assert!(html.starts_with("<h2>Pages</h2>"));
        assert!(!html.contains("<hr>"));
    }

    #[test]
    fn test_empty_section_index() {
        let html = SectionIndexTemplate {
            subsections: vec![],
            pages: vec![],
        }
        .render()
        .unwrap();
        assert_eq!(html.trim(), "<p>Coming soon.</p>");
    }

    #[test]
    fn test_breadcrumb() {
        let html = BreadcrumbTemplate {
            crumbs: vec![
                LinkEntry::new("Home", "/index.html"),
                LinkEntry::new("Topics", "/pages/topics/index.html"),
            ],
            current: "<Algebra>".to_string(),
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"<a href="/pages/topics/index.html">Topics</a>"#));
        assert!(html.contains(r#"<span class="current">&"#));
        assert!(!html.contains("<Algebra>"));
    }

    #[test]
    fn test_landing_escapes_titles() {
        let html = LandingTemplate {
            site_title: "Econ & Maths".to_string(),
            tagline: "Notes".to_string(),
            stylesheet_url: "/assets/css/style.css".to_string(),
            sidebar_html: "<nav></nav>".to_string(),
            cards: vec![LandingCard {
                title: "Topics".to_string(),
                url: "/pages/topics/index.html".to_string(),
                label: "Open Section".to_string(),
            }],
        }
        .render()
        .unwrap();
        assert!(html.contains("<title>Econ &"));
        assert!(!html.contains("Econ & Maths"));
        assert!(html.contains("<nav></nav>"));
        assert!(html.contains(r#"<a href="/pages/topics/index.html" class="button">Open Section</a>"#));
    }
}
