//! Build command implementation: renders the vault and writes the site.

use anyhow::{bail, Context, Result};
use askama::Template;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use vaultpress_core::{
    build_manifest,
    models::{DiagnosticSeverity, Section},
    BuildError, Config, Diagnostic, ManifestNode, Note, SiteBuild, SiteBuilder,
};
use vaultpress_render::{
    BreadcrumbTemplate, LandingCard, LandingTemplate, LinkEntry, PageContext, PageTemplate,
    SectionIndexTemplate, Sidebar,
};

/// An output file that could not be written; collected, never fatal
#[derive(Error, Debug)]
#[error("Failed to write {}: {source}", path.display())]
pub struct OutputWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Summary of a finished run
#[derive(Debug, Default)]
pub struct BuildReport {
    pub pages: usize,
    pub sections: usize,
    pub media: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub write_failures: Vec<OutputWriteError>,
}

impl BuildReport {
    pub fn unresolved_links(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.code == vaultpress_core::models::codes::LINK_UNRESOLVED)
            .count()
    }

    /// Whether `--strict` should fail the run
    pub fn has_strict_failures(&self) -> bool {
        !self.write_failures.is_empty() || self.unresolved_links() > 0
    }

    /// Write one output; `false` once the failure is recorded
    fn write(&mut self, path: &Path, contents: &str) -> bool {
        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(path, contents));
        match result {
            Ok(()) => {
                tracing::debug!("Wrote {:?}", path);
                true
            }
            Err(source) => {
                self.fail(path, source);
                false
            }
        }
    }

    fn copy(&mut self, from: &Path, to: &Path) -> bool {
        let result = to
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::copy(from, to).map(|_| ()));
        match result {
            Ok(()) => {
                tracing::debug!("Copied {:?} -> {:?}", from, to);
                true
            }
            Err(source) => {
                self.fail(to, source);
                false
            }
        }
    }

    fn fail(&mut self, path: &Path, source: std::io::Error) {
        let err = OutputWriteError {
            path: path.to_path_buf(),
            source,
        };
        tracing::error!("{}", err);
        self.write_failures.push(err);
    }
}

#[derive(Serialize)]
struct BuildInfo<'a> {
    builder: &'a str,
    version: &'a str,
    source: String,
    output: String,
    asset_base: &'a str,
    counts: BuildCounts,
}

#[derive(Serialize)]
struct BuildCounts {
    sections: usize,
    pages: usize,
}

/// Build the site described by `config` and write every output
pub fn build_site(config: &Config) -> Result<BuildReport> {
    if !config.book.is_dir() {
        return Err(BuildError::SourceNotFound(config.book.clone()).into());
    }
    config.check_layout()?;

    let template = PageTemplate::load(&config.template)
        .with_context(|| format!("Failed to load page template {:?}", config.template))?;

    tracing::info!("Building site from {:?}", config.book);

    let site = SiteBuilder::new(config)
        .build()
        .context("Failed to build site")?;

    clear_output_dir(config)?;

    let assembler = Assembler::new(config, &site, &template);
    let report = assembler.write_all()?;

    log_report(config, &report);
    Ok(report)
}

/// Remove the previous pages folder so deleted notes don't linger
fn clear_output_dir(config: &Config) -> Result<()> {
    let out_dir = &config.out_dir;
    if !out_dir.exists() {
        return Ok(());
    }

    let out = out_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve output directory {:?}", out_dir))?;
    let book = config
        .book
        .canonicalize()
        .with_context(|| format!("Failed to resolve source directory {:?}", config.book))?;
    if book.starts_with(&out) {
        bail!(
            "Refusing to clear output directory {:?}: it contains the source folder",
            out_dir
        );
    }

    tracing::debug!("Clearing {:?}", out_dir);
    fs::remove_dir_all(out_dir)
        .with_context(|| format!("Failed to clear output directory {:?}", out_dir))
}

struct Assembler<'a> {
    config: &'a Config,
    site: &'a SiteBuild,
    template: &'a PageTemplate,
    manifest: Vec<ManifestNode>,
    home_url: String,
}

impl<'a> Assembler<'a> {
    fn new(config: &'a Config, site: &'a SiteBuild, template: &'a PageTemplate) -> Self {
        Self {
            config,
            site,
            template,
            manifest: build_manifest(&site.tree, config),
            home_url: config.home_url(),
        }
    }

    fn sidebar(&self) -> Sidebar<'_> {
        Sidebar::new(&self.manifest, self.config.asset_base(), &self.home_url)
    }

    fn write_all(&self) -> Result<BuildReport> {
        let mut report = BuildReport {
            diagnostics: self.site.diagnostics.clone(),
            ..BuildReport::default()
        };

        self.write_pages(&mut report)?;
        self.write_section_indexes(&mut report, &self.site.tree.root)?;
        self.write_assets(&mut report)?;
        self.write_landing(&mut report)?;

        Ok(report)
    }

    fn write_pages(&self, report: &mut BuildReport) -> Result<()> {
        let notes = self.site.tree.notes();
        for (note, page) in notes.iter().zip(&self.site.pages) {
            let breadcrumb = self.note_breadcrumb(note)?;
            let page_path = self.config.page_path(&page.output_rel_path);
            let sidebar = self.sidebar().render(Some(page_path.as_str()));

            let html = self.template.render(&PageContext {
                title: &page.title,
                content: &page.content_html,
                breadcrumb: &breadcrumb,
                sidebar: &sidebar,
                asset_base: self.config.asset_base(),
            });

            let path = self.config.out_dir.join(&page.output_rel_path);
            if report.write(&path, &html) {
                report.pages += 1;
            }
        }
        Ok(())
    }

    fn write_section_indexes(&self, report: &mut BuildReport, section: &Section) -> Result<()> {
        let subsections = section
            .sections
            .iter()
            .map(|child| {
                LinkEntry::new(&child.title, self.config.page_url(&child.index_rel_path()))
            })
            .collect();
        let pages = section
            .notes
            .iter()
            .map(|note| LinkEntry::new(&note.title, self.config.page_url(&note.output_rel_path())))
            .collect();
        let body = SectionIndexTemplate { subsections, pages }
            .render()
            .context("Failed to render section index")?;

        let title = if section.is_root() {
            self.config.site.title.as_str()
        } else {
            section.title.as_str()
        };
        let index_rel = section.index_rel_path();
        let breadcrumb = self.section_breadcrumb(section, title)?;
        let index_path = self.config.page_path(&index_rel);
        let sidebar = self.sidebar().render(Some(index_path.as_str()));

        let html = self.template.render(&PageContext {
            title,
            content: &body,
            breadcrumb: &breadcrumb,
            sidebar: &sidebar,
            asset_base: self.config.asset_base(),
        });
        let written = report.write(&self.config.out_dir.join(&index_rel), &html);
        if written && !section.is_root() {
            report.sections += 1;
        }

        for child in &section.sections {
            self.write_section_indexes(report, child)?;
        }
        Ok(())
    }

    fn write_assets(&self, report: &mut BuildReport) -> Result<()> {
        let assets = &self.config.assets_dir;

        let partial = self.sidebar().render(None);
        report.write(&assets.join("partials").join("sidebar.html"), &partial);

        let manifest =
            serde_json::to_string_pretty(&self.manifest).context("Failed to serialize site.json")?;
        report.write(&assets.join("site.json"), &manifest);

        let info = BuildInfo {
            builder: "vaultpress",
            version: env!("CARGO_PKG_VERSION"),
            source: self.config.book.display().to_string(),
            output: self.config.out_dir.display().to_string(),
            asset_base: self.config.asset_base(),
            counts: BuildCounts {
                sections: self.site.tree.root.sections.len(),
                pages: self.site.pages.len(),
            },
        };
        let info =
            serde_json::to_string_pretty(&info).context("Failed to serialize build-info.json")?;
        report.write(&assets.join("build-info.json"), &info);

        let media_dir = assets.join("media");
        for media in &self.site.media {
            let dest = media
                .dest_rel
                .split('/')
                .fold(media_dir.clone(), |path, part| path.join(part));
            if report.copy(&media.source, &dest) {
                report.media += 1;
            }
        }
        Ok(())
    }

    fn write_landing(&self, report: &mut BuildReport) -> Result<()> {
        let root = &self.site.tree.root;
        let sections = root.sections.iter().map(|section| LandingCard {
            title: section.title.clone(),
            url: self.config.page_url(&section.index_rel_path()),
            label: "Open Section".to_string(),
        });
        let pages = root.notes.iter().map(|note| LandingCard {
            title: note.title.clone(),
            url: self.config.page_url(&note.output_rel_path()),
            label: "Read".to_string(),
        });

        let html = LandingTemplate {
            site_title: self.config.site.title.clone(),
            tagline: self.config.site.tagline.clone(),
            stylesheet_url: self.config.asset_url("css/style.css"),
            sidebar_html: self.sidebar().render(None),
            cards: sections.chain(pages).collect(),
        }
        .render()
        .context("Failed to render landing page")?;

        report.write(&self.config.site_root().join("index.html"), &html);
        Ok(())
    }

    fn note_breadcrumb(&self, note: &Note) -> Result<String> {
        let crumbs = self.crumbs(self.site.tree.ancestors(note));
        render_breadcrumb(crumbs, &note.title)
    }

    fn section_breadcrumb(&self, section: &Section, title: &str) -> Result<String> {
        let mut chain = self.site.tree.section_chain(section);
        chain.pop();
        render_breadcrumb(self.crumbs(chain), title)
    }

    fn crumbs(&self, sections: Vec<&Section>) -> Vec<LinkEntry> {
        std::iter::once(LinkEntry::new("Home", self.home_url.clone()))
            .chain(sections.into_iter().map(|section| {
                LinkEntry::new(&section.title, self.config.page_url(&section.index_rel_path()))
            }))
            .collect()
    }
}

fn render_breadcrumb(crumbs: Vec<LinkEntry>, current: &str) -> Result<String> {
    BreadcrumbTemplate {
        crumbs,
        current: current.to_string(),
    }
    .render()
    .context("Failed to render breadcrumb")
}

fn log_report(config: &Config, report: &BuildReport) {
    for diagnostic in &report.diagnostics {
        match diagnostic.severity {
            DiagnosticSeverity::Warning => tracing::warn!("{}", diagnostic),
            DiagnosticSeverity::Info => tracing::info!("{}", diagnostic),
        }
    }

    tracing::info!(
        "✓ Built {} pages in {} sections ({} media files)",
        report.pages,
        report.sections,
        report.media
    );
    if !report.diagnostics.is_empty() {
        tracing::info!(
            "{} diagnostics ({} unresolved links)",
            report.diagnostics.len(),
            report.unresolved_links()
        );
    }
    if !report.write_failures.is_empty() {
        tracing::warn!("{} outputs could not be written", report.write_failures.len());
    }
    tracing::info!("✓ Output written to {:?}", config.out_dir);
}
