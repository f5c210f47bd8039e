//! Markdown processing pipeline: wiki links, link and image rewriting,
//! heading ids and math delimiters on top of pulldown-cmark.

pub mod rewrite;
pub mod wikilinks;

use crate::config::Config;
use crate::links::LinkMap;
use crate::models::{codes, Diagnostic};
use crate::slug::slugify;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashSet;
use std::path::Path;

pub use rewrite::{LinkRewriter, MediaCopy};
pub use wikilinks::WikilinkTransformer;

/// Where a note sits, for resolving what it links to
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub links: &'a LinkMap,
    pub config: &'a Config,
    /// Vault-relative folder of the note
    pub note_dir: &'a Path,
    /// Vault-relative path of the note, for diagnostics
    pub source: &'a Path,
}

/// Output of rendering one note body
#[derive(Debug, Clone, Default)]
pub struct RenderedMarkdown {
    pub html: String,
    /// Path keys of linked notes, first-seen order, no duplicates
    pub outgoing_links: Vec<String>,
    /// Link targets that matched no note
    pub unresolved: Vec<String>,
    /// Local images to copy into the media folder
    pub media: Vec<MediaCopy>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Markdown processor with custom extensions
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options.insert(Options::ENABLE_MATH);

        Self { options }
    }

    /// Convert a note body to an HTML fragment
    pub fn convert(&self, markdown: &str, ctx: &RenderContext<'_>) -> RenderedMarkdown {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();

        // Wiki links go first so they win over generic link handling
        let wikilinks = WikilinkTransformer::new(ctx.links, ctx.note_dir);
        let (events, wiki_report) = wikilinks.transform(events);

        let rewriter = LinkRewriter::new(ctx.links, ctx.config, ctx.note_dir, ctx.source);
        let (events, rewrite_report) = rewriter.transform(events);

        let events = attach_heading_ids(events);
        let events = math_to_delimited_text(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        let mut outgoing_links = wiki_report.outgoing;
        for key in rewrite_report.outgoing {
            if !outgoing_links.contains(&key) {
                outgoing_links.push(key);
            }
        }

        let mut unresolved = wiki_report.unresolved;
        unresolved.extend(rewrite_report.unresolved);

        let mut diagnostics: Vec<Diagnostic> = unresolved
            .iter()
            .map(|target| {
                Diagnostic::warning(
                    codes::LINK_UNRESOLVED,
                    format!("Unresolved link to '{target}'"),
                )
                .with_source(ctx.source)
                .with_context(target.clone())
            })
            .collect();
        diagnostics.extend(rewrite_report.diagnostics);

        RenderedMarkdown {
            html: html_output,
            outgoing_links,
            unresolved,
            media: rewrite_report.media,
            diagnostics,
        }
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Give every heading without an explicit `{#id}` the slug of its text
///
/// Repeated slugs on one page get `-2`, `-3`, ... so fragments stay unique.
fn attach_heading_ids(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    let mut result = Vec::with_capacity(events.len());
    let mut used: HashSet<String> = HashSet::new();
    let mut open: Option<(usize, String)> = None;

    // explicit ids claim their slot first
    for event in &events {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            used.insert(id.to_string());
        }
    }

    for event in events {
        match event {
            Event::Start(Tag::Heading { id: None, .. }) => {
                open = Some((result.len(), String::new()));
                result.push(event);
            }
            Event::Text(ref text) | Event::Code(ref text) => {
                if let Some((_, title)) = open.as_mut() {
                    title.push_str(text);
                }
                result.push(event);
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((index, title)) = open.take() {
                    let id = unique_id(slugify(&title), &mut used);
                    if let Event::Start(Tag::Heading { id: slot, .. }) = &mut result[index] {
                        *slot = Some(CowStr::from(id));
                    }
                }
                result.push(event);
            }
            other => result.push(other),
        }
    }

    result
}

fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Hand math to the browser: `\(..\)` inline, `\[..\]` display
fn math_to_delimited_text(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    events
        .into_iter()
        .map(|event| match event {
            Event::InlineMath(math) => Event::Text(CowStr::from(format!("\\({math}\\)"))),
            Event::DisplayMath(math) => Event::Text(CowStr::from(format!("\\[{math}\\]"))),
            other => other,
        })
        .collect()
}
