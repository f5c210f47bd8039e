//! Vault scanning: turns the source folder into an ordered [`SiteTree`].

use crate::{
    config::Config,
    frontmatter::parse_frontmatter,
    models::{codes, slash_path, Diagnostic, Note, Section, SiteTree},
    slug::slugify,
};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Source folder not found or not a directory: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// Slug reserved for the section index page inside every section folder
const INDEX_SLUG: &str = "index";

/// Result of scanning a vault
#[derive(Debug, Clone)]
pub struct WalkOutput {
    pub tree: SiteTree,
    pub diagnostics: Vec<Diagnostic>,
}

/// Recursive vault scanner
pub struct TreeWalker<'a> {
    config: &'a Config,
    ignores: Vec<Regex>,
}

impl<'a> TreeWalker<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            ignores: compile_ignore_patterns(&config.ignore_patterns),
        }
    }

    /// Scan the vault into a site tree
    pub fn walk(&self) -> Result<WalkOutput, WalkError> {
        let root = &self.config.book;
        if !root.is_dir() {
            return Err(WalkError::SourceNotFound(root.clone()));
        }

        let mut diagnostics = Vec::new();
        let root_section = self.walk_section(
            root,
            PathBuf::new(),
            String::new(),
            String::new(),
            Vec::new(),
            &mut diagnostics,
        );

        tracing::debug!(
            "Scanned {} notes in {} sections",
            root_section.note_count(),
            root_section.section_count()
        );

        Ok(WalkOutput {
            tree: SiteTree { root: root_section },
            diagnostics,
        })
    }

    fn walk_section(
        &self,
        dir: &Path,
        rel_path: PathBuf,
        title: String,
        slug: String,
        slug_path: Vec<String>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Section {
        let mut pending_notes = Vec::new();
        let mut pending_dirs = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Failed to read entry in {:?}: {}", dir, err);
                    diagnostics.push(
                        Diagnostic::warning(codes::NOTE_UNREADABLE, err.to_string())
                            .with_source(&rel_path),
                    );
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_rel = rel_path.join(&name);

            if entry.file_type().is_dir() {
                if self.is_ignored(&entry_rel, true) {
                    tracing::debug!("Ignoring folder {:?} due to ignore_patterns", entry_rel);
                    continue;
                }
                pending_dirs.push(PendingDir {
                    sort_key: SortKey::new(numeric_prefix(&name).map(|(n, _)| n), &name),
                    name,
                    path: entry.into_path(),
                    rel_path: entry_rel,
                });
            } else if is_markdown(&name) && entry.path().is_file() {
                if self.is_ignored(&entry_rel, false) {
                    tracing::debug!("Ignoring {:?} due to ignore_patterns", entry_rel);
                    continue;
                }
                if let Some(note) = read_note(entry.path(), &entry_rel, &name, diagnostics) {
                    pending_notes.push(note);
                }
            }
        }

        pending_notes.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
        pending_dirs.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

        // Pages and subfolders share one scope; pages claim slugs first
        let mut slugs = SlugAllocator::with_reserved(&[INDEX_SLUG]);
        let notes = pending_notes
            .into_iter()
            .map(|pending| {
                let slug = slugs.allocate(&pending.base_slug, &pending.rel_path, diagnostics);
                Note {
                    source_path: pending.source_path,
                    rel_path: pending.rel_path,
                    title: pending.title,
                    slug,
                    parent_slugs: slug_path.clone(),
                    aliases: pending.aliases,
                    body: pending.body,
                }
            })
            .collect();

        let sections = pending_dirs
            .into_iter()
            .map(|pending| {
                let child_slug =
                    slugs.allocate(&slugify(&pending.name), &pending.rel_path, diagnostics);
                let mut child_path = slug_path.clone();
                child_path.push(child_slug.clone());
                self.walk_section(
                    &pending.path,
                    pending.rel_path,
                    pending.name,
                    child_slug,
                    child_path,
                    diagnostics,
                )
            })
            .collect();

        Section {
            title,
            slug,
            rel_path,
            slug_path,
            notes,
            sections,
        }
    }

    fn is_ignored(&self, rel_path: &Path, is_dir: bool) -> bool {
        if self.ignores.is_empty() {
            return false;
        }
        let mut rel = slash_path(rel_path);
        if self.ignores.iter().any(|re| re.is_match(&rel)) {
            return true;
        }
        is_dir && {
            rel.push('/');
            self.ignores.iter().any(|re| re.is_match(&rel))
        }
    }
}

struct PendingNote {
    sort_key: SortKey,
    source_path: PathBuf,
    rel_path: PathBuf,
    title: String,
    base_slug: String,
    aliases: Vec<String>,
    body: String,
}

struct PendingDir {
    sort_key: SortKey,
    name: String,
    path: PathBuf,
    rel_path: PathBuf,
}

/// Sibling ordering: entries with an explicit or numeric-prefix key come
/// first in key order, everything else follows by name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    unkeyed: bool,
    key: Vec<u64>,
    folded_name: String,
    name: String,
}

impl SortKey {
    fn new(key: Option<Vec<u64>>, name: &str) -> Self {
        Self {
            unkeyed: key.is_none(),
            key: key.unwrap_or_default(),
            folded_name: name.to_lowercase(),
            name: name.to_string(),
        }
    }
}

struct SlugAllocator {
    used: HashSet<String>,
}

impl SlugAllocator {
    fn with_reserved(reserved: &[&str]) -> Self {
        Self {
            used: reserved.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Hand out `base`, or the first free `base-N` (N >= 2) when it is taken
    fn allocate(&mut self, base: &str, rel_path: &Path, diagnostics: &mut Vec<Diagnostic>) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }

        let mut n = 2;
        let slug = loop {
            let candidate = format!("{base}-{n}");
            if self.used.insert(candidate.clone()) {
                break candidate;
            }
            n += 1;
        };

        tracing::debug!("Slug '{}' taken; {:?} uses '{}'", base, rel_path, slug);
        diagnostics.push(
            Diagnostic::info(
                codes::SLUG_COLLISION,
                format!("Slug '{base}' is already used in this folder; using '{slug}'"),
            )
            .with_source(rel_path)
            .with_context(slug.clone()),
        );
        slug
    }
}

fn read_note(
    path: &Path,
    rel_path: &Path,
    file_name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<PendingNote> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!("Failed to read {:?}: {}", path, err);
            diagnostics.push(
                Diagnostic::warning(codes::NOTE_UNREADABLE, format!("Failed to read note: {err}"))
                    .with_source(rel_path),
            );
            return None;
        }
    };

    let (frontmatter, body) = match parse_frontmatter(&content) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!("Skipping {:?}: {}", path, err);
            diagnostics.push(
                Diagnostic::warning(codes::NOTE_FRONTMATTER, err.to_string()).with_source(rel_path),
            );
            return None;
        }
    };

    if frontmatter.draft {
        tracing::debug!("Skipping draft: {:?}", rel_path);
        return None;
    }

    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.trim();
    let prefix = numeric_prefix(stem);
    let label = prefix.as_ref().map(|(_, label)| *label).unwrap_or(stem);

    let title = frontmatter
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(stem)
        .to_string();

    let key = frontmatter
        .order
        .map(|n| vec![n])
        .or_else(|| prefix.as_ref().map(|(n, _)| n.clone()));

    Some(PendingNote {
        sort_key: SortKey::new(key, file_name),
        source_path: path.to_path_buf(),
        rel_path: rel_path.to_path_buf(),
        body: strip_title_heading(&body, &title, label),
        base_slug: slugify(stem),
        title,
        aliases: frontmatter.aliases,
    })
}

static NUMERIC_PREFIX: OnceLock<Regex> = OnceLock::new();

/// Split `"2.10 Markets"` into `([2, 10], "Markets")`
fn numeric_prefix(name: &str) -> Option<(Vec<u64>, &str)> {
    let re = NUMERIC_PREFIX.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)*)[.)]?[\s_-]+(\S.*)$").expect("static prefix regex")
    });
    let caps = re.captures(name.trim())?;
    let numbers = caps
        .get(1)?
        .as_str()
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    Some((numbers, caps.get(2)?.as_str()))
}

/// Drop a leading `# Title` line that merely repeats the page title
fn strip_title_heading(body: &str, title: &str, label: &str) -> String {
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            offset += line.len();
            continue;
        }
        if let Some(heading) = trimmed.strip_prefix("# ") {
            let heading = heading.trim().trim_end_matches('#').trim();
            let heading = heading.to_lowercase();
            if heading == title.to_lowercase() || heading == label.to_lowercase() {
                return body[offset + line.len()..].to_string();
            }
        }
        break;
    }
    body.to_string()
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        match Regex::new(pat) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_markdown(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}
