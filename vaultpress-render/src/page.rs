//! User page template: a plain HTML file with `{{ name }}` placeholders.
//!
//! The template is parsed once per run into literal text and slots, so a
//! missing required placeholder is caught before anything is written.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template {} has no {{{{ {placeholder} }}}} placeholder", path.display())]
    MissingPlaceholder {
        path: PathBuf,
        placeholder: &'static str,
    },
}

/// Values substituted into the page template
#[derive(Debug, Clone, Copy, Default)]
pub struct PageContext<'a> {
    /// Plain text; escaped on output
    pub title: &'a str,
    pub content: &'a str,
    pub breadcrumb: &'a str,
    pub sidebar: &'a str,
    pub asset_base: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Title,
    Content,
    Breadcrumb,
    Sidebar,
    AssetBase,
}

impl Slot {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Slot::Title),
            "content" => Some(Slot::Content),
            "breadcrumb" => Some(Slot::Breadcrumb),
            "sidebar" => Some(Slot::Sidebar),
            "asset_base" => Some(Slot::AssetBase),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

const REQUIRED: &[(&str, Slot)] = &[("title", Slot::Title), ("content", Slot::Content)];

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("static placeholder regex")
    })
}

/// A parsed page template
#[derive(Debug, Clone)]
pub struct PageTemplate {
    segments: Vec<Segment>,
}

impl PageTemplate {
    /// Read and validate a template file
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let template = Self::parse(&source);
        if let Some(placeholder) = template.missing_required() {
            return Err(TemplateError::MissingPlaceholder {
                path: path.to_path_buf(),
                placeholder,
            });
        }
        tracing::debug!("Loaded template {:?}", path);
        Ok(template)
    }

    /// Split template text into literals and known slots
    ///
    /// Unknown placeholders stay in the output verbatim.
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            literal.push_str(&source[last..whole.start()]);
            match Slot::from_name(name.as_str()) {
                Some(slot) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(slot));
                }
                None => literal.push_str(whole.as_str()),
            }
            last = whole.end();
        }
        literal.push_str(&source[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    fn missing_required(&self) -> Option<&'static str> {
        REQUIRED
            .iter()
            .find(|(_, slot)| !self.segments.contains(&Segment::Slot(*slot)))
            .map(|(name, _)| *name)
    }

    /// Produce a full page
    pub fn render(&self, ctx: &PageContext<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(Slot::Title) => out.push_str(&html_escape(ctx.title)),
                Segment::Slot(Slot::Content) => out.push_str(ctx.content),
                Segment::Slot(Slot::Breadcrumb) => out.push_str(ctx.breadcrumb),
                Segment::Slot(Slot::Sidebar) => out.push_str(ctx.sidebar),
                Segment::Slot(Slot::AssetBase) => out.push_str(ctx.asset_base),
            }
        }
        out
    }
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
