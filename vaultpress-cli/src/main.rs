//! # vaultpress CLI
//!
//! Command-line interface for the vaultpress static site generator.

mod commands;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use vaultpress_core::{config, Config, SiteFile};

/// Render a folder of linked Markdown notes into a static site
#[derive(Parser)]
#[command(name = "vaultpress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Vault folder to read notes from
    #[arg(long)]
    book: PathBuf,

    /// URL prefix the site is served under, e.g. /repo-name ("/" for the root)
    #[arg(long, allow_hyphen_values = true)]
    asset_base: String,

    /// Folder for the rendered pages (cleared on every run)
    #[arg(long, default_value = config::DEFAULT_OUT_DIR)]
    out: PathBuf,

    /// Folder for the sidebar partial, manifest and media
    #[arg(long, default_value = config::DEFAULT_ASSETS_DIR)]
    assets: PathBuf,

    /// HTML page template with {{title}} and {{content}} placeholders
    #[arg(long, default_value = config::DEFAULT_TEMPLATE)]
    template: PathBuf,

    /// Optional YAML site file (site title, tagline, ignore patterns)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Regex of vault-relative paths to skip (repeatable)
    #[arg(long = "ignore", value_name = "REGEX")]
    ignore: Vec<String>,

    /// Exit with an error when an output failed to write or a link is unresolved
    #[arg(long)]
    strict: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn to_config(&self) -> Result<Config> {
        let mut config = Config::new(&self.book, &self.asset_base)
            .context("Invalid --asset-base")?
            .with_out_dir(&self.out)
            .with_assets_dir(&self.assets)
            .with_template(&self.template)
            .with_ignore_patterns(self.ignore.iter().cloned());

        if let Some(path) = &self.config {
            tracing::info!("Loading site file from {:?}", path);
            let file = SiteFile::from_file(path)
                .with_context(|| format!("Failed to load site file {:?}", path))?;
            config = config.with_site_file(file);
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.to_config()?;
    let report = commands::build_site(&config)?;

    if cli.strict && report.has_strict_failures() {
        bail!(
            "Strict mode: {} outputs failed to write, {} links unresolved",
            report.write_failures.len(),
            report.unresolved_links()
        );
    }

    Ok(())
}
