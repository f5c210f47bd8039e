//! # vaultpress-core
//!
//! Core library for the vaultpress static site generator.
//!
//! This crate turns a folder of linked Markdown notes into a content model:
//! it scans the vault into an ordered tree, maps every note name to its URL,
//! and renders note bodies to HTML fragments.

pub mod builder;
pub mod config;
pub mod frontmatter;
pub mod links;
pub mod manifest;
pub mod markdown;
pub mod models;
pub mod slug;
pub mod tree;

pub use builder::{BuildError, RenderedPage, SiteBuild, SiteBuilder};
pub use config::{Config, ConfigError, SiteConfig, SiteFile};
pub use links::{LinkMap, LinkTarget};
pub use manifest::{build_manifest, ManifestNode, NodeKind};
pub use markdown::{MarkdownProcessor, MediaCopy, RenderedMarkdown};
pub use models::{Diagnostic, DiagnosticSeverity, Frontmatter, Note, Section, SiteTree};
pub use slug::{normalize_slug, slugify};
pub use tree::{TreeWalker, WalkError};
