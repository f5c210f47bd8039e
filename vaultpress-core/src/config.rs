//! Run configuration.
//!
//! Everything a build needs is carried by one [`Config`] value that the CLI
//! assembles from its flags (and an optional YAML site file) and then hands
//! to every component.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid asset base '{0}': must be a URL path or absolute URL without spaces or quotes")]
    InvalidAssetBase(String),

    #[error("Output folder {} is the site root; the landing page would overwrite its index.html", .0.display())]
    PagesAtSiteRoot(PathBuf),
}

pub const DEFAULT_OUT_DIR: &str = "pages";
pub const DEFAULT_ASSETS_DIR: &str = "assets";
pub const DEFAULT_TEMPLATE: &str = "templates/section.html";

/// Site-wide presentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_title")]
    pub title: String,

    #[serde(default = "default_tagline")]
    pub tagline: String,
}

fn default_site_title() -> String {
    String::from("Notes")
}

fn default_tagline() -> String {
    String::from("Sections generated from the vault.")
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_site_title(),
            tagline: default_tagline(),
        }
    }
}

/// Optional YAML file with settings that don't warrant their own flag
///
/// ```yaml
/// site:
///   title: Mathematical Economics
///   tagline: Lecture notes
/// ignore_patterns:
///   - "^Templates/"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteFile {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

impl SiteFile {
    /// Load a site file from YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}

/// Configuration for a single build run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Vault folder to read notes from
    pub book: PathBuf,

    /// Folder receiving the rendered pages
    pub out_dir: PathBuf,

    /// Folder receiving the sidebar partial, manifest and media
    pub assets_dir: PathBuf,

    /// User page template
    pub template: PathBuf,

    /// Regexes matched against vault-relative paths; matches are skipped
    pub ignore_patterns: Vec<String>,

    pub site: SiteConfig,

    asset_base: String,
}

impl Config {
    /// Create a config with default output locations
    pub fn new(book: impl Into<PathBuf>, asset_base: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            book: book.into(),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            template: PathBuf::from(DEFAULT_TEMPLATE),
            ignore_patterns: Vec::new(),
            site: SiteConfig::default(),
            asset_base: normalize_asset_base(asset_base)?,
        })
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn with_assets_dir(mut self, assets_dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = assets_dir.into();
        self
    }

    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = template.into();
        self
    }

    /// Merge a site file: its settings fill in the site block, its ignore
    /// patterns come before any given on the command line
    pub fn with_site_file(mut self, file: SiteFile) -> Self {
        self.site = file.site;
        let mut patterns = file.ignore_patterns;
        patterns.append(&mut self.ignore_patterns);
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.ignore_patterns.extend(patterns);
        self
    }

    /// Normalized asset base: empty for the site root, otherwise no trailing slash
    pub fn asset_base(&self) -> &str {
        &self.asset_base
    }

    /// Folder that holds the landing page (the parent of the assets folder)
    pub fn site_root(&self) -> PathBuf {
        match self.assets_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Reject folder layouts whose outputs would overwrite each other
    pub fn check_layout(&self) -> Result<(), ConfigError> {
        if lexical(&self.out_dir) == lexical(&self.site_root()) {
            return Err(ConfigError::PagesAtSiteRoot(self.out_dir.clone()));
        }
        Ok(())
    }

    /// URL segment the pages folder is published under
    pub fn pages_segment(&self) -> String {
        url_segment(&self.out_dir)
    }

    /// URL segment the assets folder is published under
    pub fn assets_segment(&self) -> String {
        url_segment(&self.assets_dir)
    }

    /// Site-root path of a page, without the asset base (`/pages/topics/algebra.html`)
    pub fn page_path(&self, rel: &str) -> String {
        join_url("", &[&self.pages_segment(), rel])
    }

    /// Full href of a page (`{asset_base}/pages/topics/algebra.html`)
    pub fn page_url(&self, rel: &str) -> String {
        join_url(&self.asset_base, &[&self.pages_segment(), rel])
    }

    /// Full href of a file under the assets folder
    pub fn asset_url(&self, rel: &str) -> String {
        join_url(&self.asset_base, &[&self.assets_segment(), rel])
    }

    /// Full href of the landing page
    pub fn home_url(&self) -> String {
        join_url(&self.asset_base, &["index.html"])
    }
}

/// Normalize an asset base: `""` and `"/"` mean the site root (empty string),
/// paths gain a leading slash and lose trailing ones, absolute URLs are kept
pub fn normalize_asset_base(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>'))
    {
        return Err(ConfigError::InvalidAssetBase(raw.to_string()));
    }

    if trimmed.contains("://") || trimmed.starts_with("//") {
        return Ok(trimmed.trim_end_matches('/').to_string());
    }

    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("/{}", segments.join("/")))
}

fn lexical(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Turn a folder path into the URL segment it is published under
fn url_segment(path: &Path) -> String {
    if path.is_absolute() {
        return path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn join_url(base: &str, parts: &[&str]) -> String {
    let mut url = base.to_string();
    for part in parts {
        let part = part.trim_matches('/');
        if part.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(part);
    }
    if url.is_empty() {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::new("vault", "/").unwrap();
        assert_eq!(config.out_dir, PathBuf::from("pages"));
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.template, PathBuf::from("templates/section.html"));
        assert_eq!(config.asset_base(), "");
        assert_eq!(config.site.title, "Notes");
        assert_eq!(config.site_root(), PathBuf::from("."));
    }

    #[test]
    fn test_normalize_asset_base() {
        assert_eq!(normalize_asset_base("").unwrap(), "");
        assert_eq!(normalize_asset_base("/").unwrap(), "");
        assert_eq!(normalize_asset_base("repo").unwrap(), "/repo");
        assert_eq!(normalize_asset_base("/repo/").unwrap(), "/repo");
        assert_eq!(normalize_asset_base("/a//b/").unwrap(), "/a/b");
        assert_eq!(
            normalize_asset_base("https://example.org/book/").unwrap(),
            "https://example.org/book"
        );
        assert!(normalize_asset_base("/my site").is_err());
        assert!(normalize_asset_base("/\"x").is_err());
    }

    #[test]
    fn test_urls() {
        let config = Config::new("vault", "/econ").unwrap();
        assert_eq!(config.page_url("topics/algebra.html"), "/econ/pages/topics/algebra.html");
        assert_eq!(config.page_path("topics/algebra.html"), "/pages/topics/algebra.html");
        assert_eq!(config.asset_url("partials/sidebar.html"), "/econ/assets/partials/sidebar.html");
        assert_eq!(config.home_url(), "/econ/index.html");

        let root = Config::new("vault", "").unwrap();
        assert_eq!(root.page_url("intro.html"), "/pages/intro.html");
        assert_eq!(root.home_url(), "/index.html");
    }

    #[test]
    fn test_custom_dirs_drive_url_segments() {
        let config = Config::new("vault", "/")
            .unwrap()
            .with_out_dir("./site/pages")
            .with_assets_dir("site/assets");
        assert_eq!(config.pages_segment(), "site/pages");
        assert_eq!(config.site_root(), PathBuf::from("site"));

        let absolute = Config::new("vault", "/")
            .unwrap()
            .with_out_dir("/tmp/build/html");
        assert_eq!(absolute.pages_segment(), "html");
        assert_eq!(absolute.page_url("a.html"), "/html/a.html");
    }

    #[test]
    fn test_pages_at_site_root_is_rejected() {
        let clash = Config::new("vault", "/")
            .unwrap()
            .with_out_dir("./site")
            .with_assets_dir("site/assets");
        assert!(matches!(
            clash.check_layout(),
            Err(ConfigError::PagesAtSiteRoot(_))
        ));

        let flat = Config::new("vault", "/").unwrap().with_out_dir(".");
        assert!(flat.check_layout().is_err());

        let nested = Config::new("vault", "/")
            .unwrap()
            .with_out_dir("site/pages")
            .with_assets_dir("site/assets");
        assert!(nested.check_layout().is_ok());
        assert!(Config::new("vault", "/").unwrap().check_layout().is_ok());
    }

    #[test]
    fn test_site_file_merge() {
        let file = SiteFile::from_yaml(
            "site:\n  title: Mathematical Economics\nignore_patterns:\n  - '^Templates/'\n",
        )
        .unwrap();
        let config = Config::new("vault", "/")
            .unwrap()
            .with_ignore_patterns(vec!["\\.excalidraw\\.md$".to_string()])
            .with_site_file(file);

        assert_eq!(config.site.title, "Mathematical Economics");
        assert_eq!(config.site.tagline, "Sections generated from the vault.");
        assert_eq!(
            config.ignore_patterns,
            vec!["^Templates/".to_string(), "\\.excalidraw\\.md$".to_string()]
        );
    }

    #[test]
    fn test_empty_site_file() {
        let file = SiteFile::from_yaml("").unwrap();
        assert_eq!(file.site, SiteConfig::default());
        assert!(file.ignore_patterns.is_empty());
    }
}
