//! Slug generation and normalization.

use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// Token used when a string has nothing slug-worthy in it.
pub const FALLBACK_SLUG: &str = "untitled";

static HYPHEN_RUNS: OnceLock<Regex> = OnceLock::new();

fn hyphen_runs() -> &'static Regex {
    HYPHEN_RUNS.get_or_init(|| Regex::new(r"-{2,}").expect("static slug regex"))
}

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Lowercase ASCII only; accented letters lose their diacritics and
///   other scripts are transliterated
/// - Whitespace and punctuation become hyphens
/// - Runs of hyphens collapse into one
/// - Leading/trailing hyphens are trimmed
/// - Nothing left over yields [`FALLBACK_SLUG`]
///
/// # Examples
///
/// ```
/// use vaultpress_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Café Society"), "cafe-society");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// assert_eq!(slugify("???"), "untitled");
/// ```
pub fn slugify(input: &str) -> String {
    let mut raw = String::with_capacity(input.len());

    for grapheme in input.graphemes(true) {
        let Some(c) = grapheme.chars().next() else {
            continue;
        };

        if c.is_ascii_alphanumeric() {
            // Combining marks trail the base character inside the grapheme,
            // so keeping only the first char strips them.
            raw.push(c.to_ascii_lowercase());
        } else if c.is_alphanumeric() {
            let folded = ::slug::slugify(grapheme);
            if folded.is_empty() {
                raw.push('-');
            } else {
                raw.push_str(&folded);
            }
        } else {
            raw.push('-');
        }
    }

    let collapsed = hyphen_runs().replace_all(&raw, "-");
    let trimmed = collapsed.trim_matches('-');

    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize a slug (ensure it's properly formatted)
pub fn normalize_slug(slug: &str) -> String {
    slugify(slug)
}
