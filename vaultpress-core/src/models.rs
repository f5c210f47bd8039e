//! Content model structs for notes, sections, and the site tree.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Frontmatter metadata from markdown files
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub aliases: Vec<String>,

    /// Explicit position among siblings; wins over file-name ordering
    #[serde(default)]
    pub order: Option<u64>,

    #[serde(default)]
    pub draft: bool,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

/// A single note read from the vault
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Absolute path of the source file
    pub source_path: PathBuf,

    /// Path relative to the vault root (e.g. `Topics/Algebra.md`)
    pub rel_path: PathBuf,

    /// Display title
    pub title: String,

    /// URL slug, unique among the notes of its section
    pub slug: String,

    /// Slugs of the enclosing sections, outermost first
    pub parent_slugs: Vec<String>,

    /// Alternative names this note answers to in wiki links
    pub aliases: Vec<String>,

    /// Raw markdown body (without frontmatter)
    pub body: String,
}

impl Note {
    /// Folder of the note relative to the vault root
    pub fn rel_dir(&self) -> &Path {
        self.rel_path.parent().unwrap_or(Path::new(""))
    }

    /// Relative output path under the pages directory (no leading slash)
    pub fn output_rel_path(&self) -> String {
        let mut parts = self.parent_slugs.clone();
        parts.push(format!("{}.html", self.slug));
        parts.join("/")
    }

    /// Vault-relative path without the `.md` extension, using forward slashes
    pub fn path_key(&self) -> String {
        path_key(&self.rel_path)
    }
}

/// A folder node in the site tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    /// Display title (the folder name); empty for the root
    pub title: String,

    /// URL slug, unique among the sections of its parent; empty for the root
    pub slug: String,

    /// Path relative to the vault root; empty for the root
    pub rel_path: PathBuf,

    /// Slugs from the outermost section down to this one; empty for the root
    pub slug_path: Vec<String>,

    pub notes: Vec<Note>,
    pub sections: Vec<Section>,
}

impl Section {
    pub fn is_root(&self) -> bool {
        self.slug_path.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.sections.is_empty()
    }

    /// Relative output path of the section index page
    pub fn index_rel_path(&self) -> String {
        if self.is_root() {
            "index.html".to_string()
        } else {
            format!("{}/index.html", self.slug_path.join("/"))
        }
    }

    /// Number of notes in this section and all of its descendants
    pub fn note_count(&self) -> usize {
        self.notes.len() + self.sections.iter().map(Section::note_count).sum::<usize>()
    }

    /// Number of descendant sections (not counting this one)
    pub fn section_count(&self) -> usize {
        self.sections.len()
            + self
                .sections
                .iter()
                .map(Section::section_count)
                .sum::<usize>()
    }
}

/// The whole vault as an ordered hierarchy
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiteTree {
    pub root: Section,
}

impl SiteTree {
    /// All notes in tree order: a section's own pages, then its subsections
    pub fn notes(&self) -> Vec<&Note> {
        let mut out = Vec::new();
        collect_notes(&self.root, &mut out);
        out
    }

    /// All non-root sections in tree order (parents before children)
    pub fn sections(&self) -> Vec<&Section> {
        let mut out = Vec::new();
        collect_sections(&self.root, &mut out);
        out
    }

    /// Chain of non-root sections leading to the note, outermost first
    pub fn ancestors(&self, note: &Note) -> Vec<&Section> {
        let mut chain = Vec::new();
        let mut current = &self.root;
        for slug in &note.parent_slugs {
            match current.sections.iter().find(|s| &s.slug == slug) {
                Some(next) => {
                    chain.push(next);
                    current = next;
                }
                None => break,
            }
        }
        chain
    }

    /// Chain of non-root sections leading to and including `section`
    pub fn section_chain(&self, section: &Section) -> Vec<&Section> {
        let mut chain = Vec::new();
        let mut current = &self.root;
        for slug in &section.slug_path {
            match current.sections.iter().find(|s| &s.slug == slug) {
                Some(next) => {
                    chain.push(next);
                    current = next;
                }
                None => break,
            }
        }
        chain
    }
}

fn collect_notes<'a>(section: &'a Section, out: &mut Vec<&'a Note>) {
    out.extend(section.notes.iter());
    for child in &section.sections {
        collect_notes(child, out);
    }
}

fn collect_sections<'a>(section: &'a Section, out: &mut Vec<&'a Section>) {
    for child in &section.sections {
        out.push(child);
        collect_sections(child, out);
    }
}

/// Lookup key for a vault path: forward slashes, no `.md` extension, case preserved
pub fn path_key(path: &Path) -> String {
    let joined = slash_path(path);
    match joined.strip_suffix(".md") {
        Some(stripped) => stripped.to_string(),
        None => joined,
    }
}

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Info,
    Warning,
}

/// Non-fatal finding collected during a build and reported at the end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable code such as `link.unresolved`
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    /// Vault-relative path of the note concerned, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// Extra detail (link target, colliding slug, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: DiagnosticSeverity::Warning,
            source_path: None,
            context: None,
        }
    }

    pub fn info(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Info,
            ..Self::warning(code, message)
        }
    }

    pub fn with_source(mut self, path: &Path) -> Self {
        self.source_path = Some(slash_path(path));
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Vault path joined with forward slashes, extension kept
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.code)?;
        if let Some(path) = &self.source_path {
            write!(f, "{}: ", path)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Well-known diagnostic codes
pub mod codes {
    pub const LINK_UNRESOLVED: &str = "link.unresolved";
    pub const LINK_AMBIGUOUS: &str = "link.ambiguous";
    pub const SLUG_COLLISION: &str = "slug.collision";
    pub const NOTE_UNREADABLE: &str = "note.unreadable";
    pub const NOTE_FRONTMATTER: &str = "note.frontmatter";
    pub const MEDIA_MISSING: &str = "media.missing";
    pub const MEDIA_OUTSIDE: &str = "media.outside";
}
