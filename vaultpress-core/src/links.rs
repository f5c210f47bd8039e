//! Link Map: every note's names and paths mapped to its published URL.
//!
//! The map is built once from the complete [`SiteTree`] before any page is
//! rendered, so a note can link to notes that come later in the tree.

use crate::config::Config;
use crate::models::{codes, Diagnostic, SiteTree};
use std::collections::HashMap;
use std::path::Path;

/// A note as seen from a link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTarget {
    pub title: String,
    /// Vault-relative path without `.md`, forward slashes
    pub path_key: String,
    /// Full href of the rendered page
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct LinkMap {
    targets: Vec<LinkTarget>,
    by_name: HashMap<String, usize>,
    by_path: HashMap<String, usize>,
}

impl LinkMap {
    /// Index every note of the tree by lowercased title, aliases and path
    ///
    /// Names claimed by more than one note go to the first note in tree
    /// order; each later claimant produces a `link.ambiguous` diagnostic.
    pub fn build(tree: &SiteTree, config: &Config) -> (Self, Vec<Diagnostic>) {
        let mut map = LinkMap::default();
        let mut diagnostics = Vec::new();

        for note in tree.notes() {
            let index = map.targets.len();
            let path_key = note.path_key();
            map.targets.push(LinkTarget {
                title: note.title.clone(),
                path_key: path_key.clone(),
                url: config.page_url(&note.output_rel_path()),
            });
            map.by_path.insert(path_key.to_lowercase(), index);

            let names = std::iter::once(&note.title).chain(note.aliases.iter());
            for name in names {
                let key = name.trim().to_lowercase();
                if key.is_empty() {
                    continue;
                }
                match map.by_name.get(&key) {
                    Some(&existing) if existing != index => {
                        let winner = &map.targets[existing].path_key;
                        tracing::debug!("Name '{}' is ambiguous; keeping {}", name, winner);
                        diagnostics.push(
                            Diagnostic::warning(
                                codes::LINK_AMBIGUOUS,
                                format!("'{name}' also names {winner}; links to it go there"),
                            )
                            .with_source(&note.rel_path)
                            .with_context(name.clone()),
                        );
                    }
                    Some(_) => {}
                    None => {
                        map.by_name.insert(key, index);
                    }
                }
            }
        }

        (map, diagnostics)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Resolve a link reference written in a note living in `from_dir`
    ///
    /// Tries, in order: title or alias, then [`LinkMap::resolve_path`].
    /// Wiki links use this; a title match wins over a file path.
    pub fn resolve(&self, reference: &str, from_dir: &Path) -> Option<&LinkTarget> {
        let reference = strip_md_extension(reference.trim());
        if reference.is_empty() {
            return None;
        }

        if let Some(&index) = self.by_name.get(&reference.to_lowercase()) {
            return Some(&self.targets[index]);
        }
        self.resolve_path(reference, from_dir)
    }

    /// Resolve a file path written in a note living in `from_dir`
    ///
    /// Tries, in order: path relative to `from_dir`, path relative to the
    /// vault root, and finally a path suffix that matches exactly one note.
    /// Titles are never consulted.
    pub fn resolve_path(&self, reference: &str, from_dir: &Path) -> Option<&LinkTarget> {
        let reference = strip_md_extension(reference.trim());
        if reference.is_empty() {
            return None;
        }
        let lowered = reference.to_lowercase();

        let from_dir = crate::models::slash_path(from_dir).to_lowercase();
        if let Some(joined) = join_relative(&from_dir, &lowered) {
            if let Some(&index) = self.by_path.get(&joined) {
                return Some(&self.targets[index]);
            }
        }

        if let Some(rooted) = join_relative("", lowered.trim_start_matches('/')) {
            if let Some(&index) = self.by_path.get(&rooted) {
                return Some(&self.targets[index]);
            }

            let suffix = format!("/{rooted}");
            let mut matches = self
                .targets
                .iter()
                .filter(|t| t.path_key.to_lowercase().ends_with(&suffix));
            if let (Some(only), None) = (matches.next(), matches.next()) {
                return Some(only);
            }
        }

        None
    }
}

fn strip_md_extension(reference: &str) -> &str {
    let len = reference.len();
    if len > 3 && reference.is_char_boundary(len - 3) && reference[len - 3..].eq_ignore_ascii_case(".md")
    {
        &reference[..len - 3]
    } else {
        reference
    }
}

/// Join `rel` onto `base`, folding `.` and `..`; `None` when it leaves the vault
fn join_relative(base: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
