//! Wikilink transformation for [[target]] and [[target|text]] syntax.

use crate::links::LinkMap;
use crate::slug::slugify;
use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};
use std::path::Path;

/// Image extensions that turn an `![[embed]]` into an `<img>`
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "bmp"];

/// What the transformer learned about a page's wiki links
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WikilinkReport {
    /// Path keys of the notes linked to, in first-seen order
    pub outgoing: Vec<String>,
    /// Targets that matched no note, as written
    pub unresolved: Vec<String>,
}

/// Transformer for wikilink syntax
pub struct WikilinkTransformer<'a> {
    links: &'a LinkMap,
    from_dir: &'a Path,
}

impl<'a> WikilinkTransformer<'a> {
    /// `from_dir` is the vault-relative folder of the note being rendered
    pub fn new(links: &'a LinkMap, from_dir: &'a Path) -> Self {
        Self { links, from_dir }
    }

    /// Transform events, converting [[wikilinks]] to HTML links
    pub fn transform(&self, events: Vec<Event<'_>>) -> (Vec<Event<'static>>, WikilinkReport) {
        let mut result = Vec::with_capacity(events.len());
        let mut report = WikilinkReport::default();
        let mut in_code_block = false;
        let mut pending_text = String::new();

        for event in events {
            match event {
                Event::Text(text) if !in_code_block => {
                    pending_text.push_str(&text);
                    continue;
                }
                other => {
                    self.flush_text(&mut pending_text, &mut result, &mut report);
                    match &other {
                        Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                        Event::End(TagEnd::CodeBlock) => in_code_block = false,
                        _ => {}
                    }
                    result.push(other.into_static());
                }
            }
        }
        self.flush_text(&mut pending_text, &mut result, &mut report);

        (result, report)
    }

    fn flush_text(
        &self,
        pending: &mut String,
        result: &mut Vec<Event<'static>>,
        report: &mut WikilinkReport,
    ) {
        if pending.is_empty() {
            return;
        }
        let text = std::mem::take(pending);
        if text.contains("[[") && text.contains("]]") {
            self.process_wikilinks(&text, result, report);
        } else {
            result.push(Event::Text(CowStr::from(text)));
        }
    }

    fn process_wikilinks(
        &self,
        text: &str,
        events: &mut Vec<Event<'static>>,
        report: &mut WikilinkReport,
    ) {
        let mut remaining = text;

        while let Some(start) = remaining.find("[[") {
            let Some(len) = remaining[start + 2..].find("]]") else {
                break;
            };
            let inner = &remaining[start + 2..start + 2 + len];
            let embed = remaining[..start].ends_with('!');
            let before_end = if embed { start - 1 } else { start };

            if before_end > 0 {
                events.push(Event::Text(CowStr::from(remaining[..before_end].to_string())));
            }
            self.create_link(inner, embed, events, report);

            remaining = &remaining[start + 2 + len + 2..];
        }

        if !remaining.is_empty() {
            events.push(Event::Text(CowStr::from(remaining.to_string())));
        }
    }

    fn create_link(
        &self,
        wikilink: &str,
        embed: bool,
        events: &mut Vec<Event<'static>>,
        report: &mut WikilinkReport,
    ) {
        // Parse [[target|display text]] or [[target]]
        let (target, display) = match wikilink.split_once('|') {
            Some((target, display)) => (target.trim(), Some(display.trim())),
            None => (wikilink.trim(), None),
        };

        let (target_base, fragment) = match target.split_once('#') {
            Some((base, frag)) => (base.trim(), Some(frag.trim()).filter(|f| !f.is_empty())),
            None => (target, None),
        };

        if embed && is_image(target_base) {
            // Left relative; the media pass rewrites and records it
            let alt = display.unwrap_or(target_base).to_string();
            events.push(Event::Start(Tag::Image {
                link_type: LinkType::Inline,
                dest_url: CowStr::from(target_base.to_string()),
                title: CowStr::Borrowed(""),
                id: CowStr::Borrowed(""),
            }));
            events.push(Event::Text(CowStr::from(alt)));
            events.push(Event::End(TagEnd::Image));
            return;
        }

        let display_text = match (display, fragment) {
            (Some(display), _) if !display.is_empty() => display,
            (_, Some(frag)) if target_base.is_empty() => frag,
            _ => target,
        };

        let href = if target_base.is_empty() {
            fragment.map(|frag| format!("#{}", slugify(frag)))
        } else {
            self.links.resolve(target_base, self.from_dir).map(|dest| {
                if !report.outgoing.contains(&dest.path_key) {
                    report.outgoing.push(dest.path_key.clone());
                }
                match fragment {
                    Some(frag) => format!("{}#{}", dest.url, slugify(frag)),
                    None => dest.url.clone(),
                }
            })
        };

        let Some(href) = href else {
            tracing::debug!("Unresolved wikilink [[{}]] in {:?}", target, self.from_dir);
            report.unresolved.push(target.to_string());
            events.push(Event::Text(CowStr::from(display_text.to_string())));
            return;
        };

        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Inline,
            dest_url: CowStr::from(href),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.push(Event::Text(CowStr::from(display_text.to_string())));
        events.push(Event::End(TagEnd::Link));
    }
}

fn is_image(target: &str) -> bool {
    Path::new(target)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
