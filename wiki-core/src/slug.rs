//! Slug generation and normalization.
//!
//! Two distinct slug flavors are needed by the content pipeline:
//!
//! - **Note slugs** (`note_slug`): derived from a vault-relative path (or a
//!   title, for lookup purposes). Preserve `/` as a path separator,
//!   percent-encode individual segments, and apply a selectable case policy.
//! - **Heading slugs** (`heading_slug`): derived from heading text for
//!   in-page anchors. Collapse everything that isn't alphanumeric to `-`,
//!   lowercase, trim.
//!
//! Both are idempotent: `slug(slug(x)) == slug(x)`.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::sync::OnceLock;

/// Case handling for [`note_slug`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugCase {
    /// Keep the original case (used for title-derived slugs).
    Preserve,
    /// Lowercase the whole string (used for path-derived slugs).
    Lower,
}

/// Characters that must be percent-encoded within a single path segment.
/// `/` is deliberately excluded — it is the segment separator, not part of
/// a segment.
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'#')
    .add(b'%');

fn dash_collapse_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// Derive a URL-safe note slug from a vault-relative path (or a title).
///
/// Steps: strip a trailing `.md`, replace whitespace with `-`, collapse
/// consecutive `-`, trim leading/trailing `/` and `-`, percent-encode each
/// `/`-separated segment, and finally apply `case`.
pub fn note_slug(input: &str, case: SlugCase) -> String {
    let without_ext = input.strip_suffix(".md").unwrap_or(input);

    let with_dashes: String = without_ext
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    let collapsed = dash_collapse_regex().replace_all(&with_dashes, "-");
    let trimmed = collapsed.trim_matches(|c| c == '/' || c == '-');

    let encoded = trimmed
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("/");

    match case {
        SlugCase::Preserve => encoded,
        SlugCase::Lower => encoded.to_lowercase(),
    }
}

/// Path-derived slug: lowercased, per spec §3.
pub fn path_slug(path: &str) -> String {
    note_slug(path, SlugCase::Lower)
}

/// Title-derived slug: case-preserving, per spec §3.
pub fn title_slug(title: &str) -> String {
    note_slug(title, SlugCase::Preserve)
}

/// Collapse a heading's text into an anchor-safe slug: lowercase,
/// non-alphanumerics become `-`, consecutive `-` collapse, trim edges.
pub fn heading_slug(input: &str) -> String {
    let lowered = input.to_lowercase();
    let dashed: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let collapsed = dash_collapse_regex().replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

/// Normalize a tag: lowercase, trimmed (spec §4.5).
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}
