//! Destination rewriting for relative `.md` links and local images.

use crate::config::Config;
use crate::links::LinkMap;
use crate::models::{codes, Diagnostic};
use crate::slug::slugify;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use std::path::{Path, PathBuf};

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A vault file the assembler must copy into the media folder
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MediaCopy {
    /// Location of the file inside the vault
    pub source: PathBuf,
    /// Destination relative to `{assets}/media`, forward slashes
    pub dest_rel: String,
}

#[derive(Debug, Default)]
pub struct RewriteReport {
    pub outgoing: Vec<String>,
    pub unresolved: Vec<String>,
    pub media: Vec<MediaCopy>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct LinkRewriter<'a> {
    links: &'a LinkMap,
    config: &'a Config,
    note_dir: &'a Path,
    source: &'a Path,
}

impl<'a> LinkRewriter<'a> {
    /// `note_dir` and `source` are relative to the vault root
    pub fn new(links: &'a LinkMap, config: &'a Config, note_dir: &'a Path, source: &'a Path) -> Self {
        Self {
            links,
            config,
            note_dir,
            source,
        }
    }

    /// Rewrite link and image destinations
    ///
    /// An unresolved `.md` link loses its anchor: only its text is kept.
    pub fn transform(&self, events: Vec<Event<'static>>) -> (Vec<Event<'static>>, RewriteReport) {
        let mut report = RewriteReport::default();
        let mut result = Vec::with_capacity(events.len());
        let mut dropped_link = false;

        for event in events {
            match event {
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => match self.rewrite_link(dest_url, &mut report) {
                    Some(dest_url) => result.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url,
                        title,
                        id,
                    })),
                    None => dropped_link = true,
                },
                Event::End(TagEnd::Link) if dropped_link => dropped_link = false,
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    let dest_url = self.rewrite_image(dest_url, &mut report);
                    result.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                }
                other => result.push(other),
            }
        }

        (result, report)
    }

    /// New destination for a link; `None` when a `.md` target is unresolved
    fn rewrite_link(
        &self,
        dest: CowStr<'static>,
        report: &mut RewriteReport,
    ) -> Option<CowStr<'static>> {
        if is_external(&dest) {
            return Some(dest);
        }
        let (path, fragment) = match dest.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (dest.as_ref(), None),
        };
        if !path.to_ascii_lowercase().ends_with(".md") {
            return Some(dest);
        }

        let decoded = percent_decode_str(path).decode_utf8_lossy().into_owned();
        match self.links.resolve_path(&decoded, self.note_dir) {
            Some(target) => {
                if !report.outgoing.contains(&target.path_key) {
                    report.outgoing.push(target.path_key.clone());
                }
                let href = match fragment.filter(|f| !f.is_empty()) {
                    Some(frag) => {
                        let frag = percent_decode_str(frag).decode_utf8_lossy();
                        format!("{}#{}", target.url, slugify(&frag))
                    }
                    None => target.url.clone(),
                };
                Some(CowStr::from(href))
            }
            None => {
                tracing::debug!("Unresolved link {} in {:?}", dest, self.source);
                report.unresolved.push(dest.to_string());
                None
            }
        }
    }

    fn rewrite_image(&self, dest: CowStr<'static>, report: &mut RewriteReport) -> CowStr<'static> {
        if is_external(&dest) || dest.starts_with('/') || dest.is_empty() {
            return dest;
        }
        let path = dest.split(['?', '#']).next().unwrap_or_default();
        let decoded = percent_decode_str(path).decode_utf8_lossy().into_owned();

        let Some(rel) = join_inside(self.note_dir, &decoded) else {
            tracing::warn!("Image {} in {:?} points outside the vault", dest, self.source);
            report.diagnostics.push(
                Diagnostic::warning(
                    codes::MEDIA_OUTSIDE,
                    format!("Image '{dest}' points outside the vault"),
                )
                .with_source(self.source)
                .with_context(dest.to_string()),
            );
            return dest;
        };

        let source = rel
            .iter()
            .fold(self.config.book.clone(), |path, part| path.join(part));
        if !source.is_file() {
            report.diagnostics.push(
                Diagnostic::warning(codes::MEDIA_MISSING, format!("Image '{dest}' not found"))
                    .with_source(self.source)
                    .with_context(dest.to_string()),
            );
            return dest;
        }

        let dest_rel = rel.join("/");
        let encoded = rel
            .iter()
            .map(|part| utf8_percent_encode(part, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        let copy = MediaCopy { source, dest_rel };
        if !report.media.contains(&copy) {
            report.media.push(copy);
        }
        CowStr::from(self.config.asset_url(&format!("media/{encoded}")))
    }
}

/// Anything with a scheme, protocol-relative, or a pure fragment
fn is_external(dest: &str) -> bool {
    dest.starts_with('#')
        || dest.starts_with("//")
        || dest.contains("://")
        || dest
            .split_once(':')
            .is_some_and(|(scheme, _)| {
                !scheme.is_empty()
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            })
}

/// Resolve `rel` against `dir`, returning the segments; `None` if it escapes
fn join_inside(dir: &Path, rel: &str) -> Option<Vec<String>> {
    let mut parts: Vec<String> = dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    for segment in rel.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other.to_string()),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}
