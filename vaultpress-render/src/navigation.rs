//! Sidebar navigation rendered from the site manifest.

use crate::page::html_escape;
use vaultpress_core::{ManifestNode, NodeKind};

/// Navigation tree for the sidebar partial and the per-page sidebar
#[derive(Debug, Clone)]
pub struct Sidebar<'a> {
    nodes: &'a [ManifestNode],
    asset_base: &'a str,
    home_url: &'a str,
}

impl<'a> Sidebar<'a> {
    pub fn new(nodes: &'a [ManifestNode], asset_base: &'a str, home_url: &'a str) -> Self {
        Self {
            nodes,
            asset_base,
            home_url,
        }
    }

    /// Render the sidebar; the entry whose site path equals `active` gets
    /// `class="active"`
    pub fn render(&self, active: Option<&str>) -> String {
        let mut html = String::new();
        html.push_str("<div class=\"card\">\n");
        html.push_str("  <nav class=\"site-nav\">\n");
        html.push_str(&format!(
            "    <a href=\"{}\" data-match=\"/index.html\">Home</a>\n",
            html_escape(self.home_url)
        ));
        html.push_str("    <hr class=\"nav-rule\">\n");
        html.push_str("    <strong class=\"nav-heading\">Sections</strong>\n");
        if !self.nodes.is_empty() {
            self.render_list(&mut html, self.nodes, active, 2);
        }
        html.push_str("  </nav>\n");
        html.push_str("</div>\n");
        html
    }

    fn render_list(&self, html: &mut String, nodes: &[ManifestNode], active: Option<&str>, depth: usize) {
        let indent = "  ".repeat(depth);
        html.push_str(&format!("{indent}<ul class=\"nav-list\">\n"));
        for node in nodes {
            let class = match node.kind {
                NodeKind::Section => "nav-section",
                NodeKind::Page => "nav-page",
            };
            let active_attr = if active == Some(node.path.as_str()) {
                " class=\"active\" aria-current=\"page\""
            } else {
                ""
            };
            html.push_str(&format!(
                "{indent}  <li class=\"{class}\"><a href=\"{}{}\"{active_attr}>{}</a>",
                html_escape(self.asset_base),
                html_escape(&node.path),
                html_escape(&node.title)
            ));
            if node.children.is_empty() {
                html.push_str("</li>\n");
            } else {
                html.push('\n');
                self.render_list(html, &node.children, active, depth + 2);
                html.push_str(&format!("{indent}  </li>\n"));
            }
        }
        html.push_str(&format!("{indent}</ul>\n"));
    }
}
