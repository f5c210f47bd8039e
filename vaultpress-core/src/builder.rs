//! Site building logic: walk the vault, build the link map, render every note.

use crate::{
    config::Config,
    links::LinkMap,
    markdown::{MarkdownProcessor, MediaCopy, RenderContext},
    models::{Diagnostic, Note, SiteTree},
    tree::{TreeWalker, WalkError},
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Source folder not found or not a directory: {}", .0.display())]
    SourceNotFound(PathBuf),
}

impl From<WalkError> for BuildError {
    fn from(err: WalkError) -> Self {
        match err {
            WalkError::SourceNotFound(path) => BuildError::SourceNotFound(path),
        }
    }
}

/// A note rendered to an HTML fragment, not yet wrapped in the page template
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Vault-relative path key of the note
    pub path_key: String,
    pub title: String,
    /// Output path relative to the pages folder
    pub output_rel_path: String,
    pub content_html: String,
    pub outgoing_links: Vec<String>,
}

/// Everything the assembler needs to write the site
#[derive(Debug, Clone)]
pub struct SiteBuild {
    pub tree: SiteTree,
    pub links: LinkMap,
    /// One entry per note, in tree order
    pub pages: Vec<RenderedPage>,
    /// Images to copy, sorted and deduplicated
    pub media: Vec<MediaCopy>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SiteBuild {
    pub fn unresolved_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.code == crate::models::codes::LINK_UNRESOLVED)
            .count()
    }
}

/// Main site builder
pub struct SiteBuilder<'a> {
    config: &'a Config,
    processor: MarkdownProcessor,
}

impl<'a> SiteBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            processor: MarkdownProcessor::new(),
        }
    }

    /// Build the entire site in memory
    pub fn build(&self) -> Result<SiteBuild, BuildError> {
        // First pass: discover every note
        let walked = TreeWalker::new(self.config).walk()?;
        let mut diagnostics = walked.diagnostics;
        let tree = walked.tree;

        tracing::info!(
            "Found {} notes in {} sections",
            tree.root.note_count(),
            tree.root.section_count()
        );

        let (links, mut link_diags) = LinkMap::build(&tree, self.config);
        diagnostics.append(&mut link_diags);

        // Second pass: render with the complete link map
        let mut pages = Vec::new();
        let mut media = Vec::new();
        for note in tree.notes() {
            let (page, mut note_media, mut note_diags) = self.render_note(note, &links);
            pages.push(page);
            media.append(&mut note_media);
            diagnostics.append(&mut note_diags);
        }
        media.sort();
        media.dedup();

        Ok(SiteBuild {
            tree,
            links,
            pages,
            media,
            diagnostics,
        })
    }

    fn render_note(
        &self,
        note: &Note,
        links: &LinkMap,
    ) -> (RenderedPage, Vec<MediaCopy>, Vec<Diagnostic>) {
        tracing::debug!("Rendering {:?}", note.rel_path);
        let ctx = RenderContext {
            links,
            config: self.config,
            note_dir: note.rel_dir(),
            source: &note.rel_path,
        };
        let rendered = self.processor.convert(&note.body, &ctx);

        let page = RenderedPage {
            path_key: note.path_key(),
            title: note.title.clone(),
            output_rel_path: note.output_rel_path(),
            content_html: rendered.html,
            outgoing_links: rendered.outgoing_links,
        };
        (page, rendered.media, rendered.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::codes;
    use std::fs;
    use tempfile::TempDir;

    fn vault(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_build_resolves_forward_links() {
        let dir = vault(&[
            ("Intro.md", "See [[Topics/Algebra]] and [[Zeta]]"),
            ("Topics/Algebra.md", "Back to [[Intro]]"),
            ("Zeta.md", "last"),
        ]);
        let config = Config::new(dir.path(), "/").unwrap();
        let site = SiteBuilder::new(&config).build().unwrap();

        let paths: Vec<_> = site.pages.iter().map(|p| p.output_rel_path.as_str()).collect();
        assert_eq!(paths, vec!["intro.html", "zeta.html", "topics/algebra.html"]);

        let intro = &site.pages[0];
        assert!(intro
            .content_html
            .contains(r#"<a href="/pages/topics/algebra.html">Topics/Algebra</a>"#));
        assert!(intro.content_html.contains(r#"<a href="/pages/zeta.html">Zeta</a>"#));
        assert_eq!(intro.outgoing_links, vec!["Topics/Algebra", "Zeta"]);
        assert_eq!(site.unresolved_count(), 0);
    }

    #[test]
    fn test_every_unique_title_resolves() {
        let dir = vault(&[
            ("A.md", "[[B]] [[C]]"),
            ("Sub/B.md", "[[A]] [[C]]"),
            ("Sub/Deeper/C.md", "[[A]] [[B]]"),
        ]);
        let config = Config::new(dir.path(), "/site").unwrap();
        let site = SiteBuilder::new(&config).build().unwrap();
        for page in &site.pages {
            assert_eq!(page.outgoing_links.len(), 2, "{}", page.path_key);
            assert!(!page.content_html.contains("[["));
        }
        assert!(site.diagnostics.is_empty());
    }

    #[test]
    fn test_unresolved_and_media_are_collected() {
        let dir = vault(&[
            ("Intro.md", "[[Ghost]] ![p](img/p.png) ![p again](img/p.png)"),
            ("img/p.png", "png"),
        ]);
        let config = Config::new(dir.path(), "/").unwrap();
        let site = SiteBuilder::new(&config).build().unwrap();

        assert_eq!(site.unresolved_count(), 1);
        assert_eq!(site.diagnostics[0].code, codes::LINK_UNRESOLVED);
        assert_eq!(site.media.len(), 1);
        assert_eq!(site.media[0].dest_rel, "img/p.png");
    }

    #[test]
    fn test_missing_source() {
        let config = Config::new("/no/such/vault", "/").unwrap();
        let err = SiteBuilder::new(&config).build().unwrap_err();
        assert!(matches!(err, BuildError::SourceNotFound(_)));
    }
}
