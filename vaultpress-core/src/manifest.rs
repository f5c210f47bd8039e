//! Site manifest: the JSON shape of the navigation tree.

use crate::config::Config;
use crate::models::{Section, SiteTree};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Section,
    Page,
}

/// One entry of `site.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestNode {
    pub kind: NodeKind,
    pub title: String,
    pub slug: String,
    /// Path from the site root, without the asset base
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ManifestNode>,
}

/// Top-level manifest nodes: root pages first, then sections
pub fn build_manifest(tree: &SiteTree, config: &Config) -> Vec<ManifestNode> {
    section_children(&tree.root, config)
}

fn section_children(section: &Section, config: &Config) -> Vec<ManifestNode> {
    let pages = section.notes.iter().map(|note| ManifestNode {
        kind: NodeKind::Page,
        title: note.title.clone(),
        slug: note.slug.clone(),
        path: config.page_path(&note.output_rel_path()),
        children: Vec::new(),
    });
    let sections = section.sections.iter().map(|child| ManifestNode {
        kind: NodeKind::Section,
        title: child.title.clone(),
        slug: child.slug.clone(),
        path: config.page_path(&child.index_rel_path()),
        children: section_children(child, config),
    });
    pages.chain(sections).collect()
}
