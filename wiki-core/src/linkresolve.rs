//! L4: wikilink/hashtag rewriting, title resolution, and the
//! backreference pass.
//!
//! The scanner below is hand-written rather than regex-driven: tracking
//! fenced-code-block state, inline-code-span state, and triple-bracket
//! exclusions with lookaround would strain `regex`'s non-backtracking
//! engine, so a single forward pass over the markdown text does it
//! directly, emitting rewritten markdown (not HTML — rendering stays out
//! of scope).

use crate::models::{BackReference, Diagnostic, Note};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Resolve wikilinks and hashtags across every note's body and metadata,
/// then build backreferences. Consumes the raw notes from the explorer
/// and returns the fully resolved set plus any diagnostics.
pub fn resolve_all(mut notes: Vec<Note>) -> (Vec<Note>, Vec<Diagnostic>) {
    let diagnostics = Vec::new();

    let title_to_slug: HashMap<String, (String, usize)> = notes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.title.clone(), (n.slug.clone(), i)))
        .collect();

    // Pass 1: rewrite body + metadata, recording resolved wikilink targets
    // per note (by title) for the backreference pass.
    let mut linked_titles_per_note: Vec<Vec<String>> = Vec::with_capacity(notes.len());
    for note in &mut notes {
        let mut resolve = |target: &str| -> Option<String> {
            title_to_slug.get(target).map(|(slug, _)| slug.clone())
        };
        let RewriteResult {
            body,
            linked_titles,
        } = rewrite_body(&note.content, &mut resolve);
        note.content = body;

        let metadata_links = collect_metadata_link_targets(&note.metadata);
        note.metadata = rewrite_metadata_links(&note.metadata, &mut resolve);

        let mut all_titles = linked_titles;
        for t in metadata_links {
            if !all_titles.contains(&t) {
                all_titles.push(t);
            }
        }
        linked_titles_per_note.push(all_titles);
    }

    // Pass 2: backreferences, iterating public notes only, deduplicated by
    // source slug before appending (`[[A|A]]` + `[[A]]` count once; two
    // distinct source notes that happen to share a title must not be
    // collapsed into one backreference).
    let mut backrefs: Vec<Vec<BackReference>> = vec![Vec::new(); notes.len()];
    for (i, note) in notes.iter().enumerate() {
        if !note.is_public {
            continue;
        }
        for target_title in &linked_titles_per_note[i] {
            if let Some((_, target_idx)) = title_to_slug.get(target_title) {
                if *target_idx == i {
                    continue;
                }
                let entry = BackReference {
                    slug: note.slug.clone(),
                    title: note.title.clone(),
                };
                if !backrefs[*target_idx].iter().any(|b| b.slug == entry.slug) {
                    backrefs[*target_idx].push(entry);
                }
            }
        }
    }

    for (note, refs) in notes.iter_mut().zip(backrefs.into_iter()) {
        note.referenced_by = refs;
    }

    (notes, diagnostics)
}

struct RewriteResult {
    body: String,
    linked_titles: Vec<String>,
}

/// Rewrite `[[target]]`/`[[target|alias]]` wikilinks and `#tag` hashtags
/// in a markdown body, line by line, tracking fenced-code-block state
/// across lines and inline-code-span state within a line.
fn rewrite_body(body: &str, resolve: &mut impl FnMut(&str) -> Option<String>) -> RewriteResult {
    let mut out_lines: Vec<String> = Vec::new();
    let mut linked_titles: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            out_lines.push(line.to_string());
            continue;
        }
        if in_fence {
            out_lines.push(line.to_string());
            continue;
        }
        out_lines.push(rewrite_line(line, resolve, &mut linked_titles));
    }

    RewriteResult {
        body: out_lines.join("\n"),
        linked_titles,
    }
}

fn rewrite_line(
    line: &str,
    resolve: &mut impl FnMut(&str) -> Option<String>,
    linked_titles: &mut Vec<String>,
) -> String {
    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(line.len());
    let mut i = 0usize;
    let mut in_code = false;

    while i < len {
        let c = chars[i];

        if c == '`' {
            in_code = !in_code;
            out.push(c);
            i += 1;
            continue;
        }

        if in_code {
            out.push(c);
            i += 1;
            continue;
        }

        if c == '[' && i + 1 < len && chars[i + 1] == '[' {
            let triple_open = (i > 0 && chars[i - 1] == '[') || (i + 2 < len && chars[i + 2] == '[');
            if let Some(close) = find_close(&chars, i + 2) {
                let triple_close = close + 2 < len && chars[close + 2] == ']';
                if !triple_open && !triple_close {
                    let inner: String = chars[i + 2..close].iter().collect();
                    let (target, alias) = match inner.split_once('|') {
                        Some((t, a)) => (t.trim(), Some(a.trim())),
                        None => (inner.trim(), None),
                    };
                    if target.is_empty() {
                        i = close + 2;
                        continue;
                    }
                    let display = alias.unwrap_or(target);
                    match resolve(target) {
                        Some(slug) => {
                            out.push_str(&format!("[{display}](/{slug})"));
                            linked_titles.push(target.to_string());
                        }
                        None => out.push_str(display),
                    }
                    i = close + 2;
                    continue;
                }
            }
            out.push(c);
            i += 1;
            continue;
        }

        if c == '#' {
            let preceding_ok = i == 0
                || !(chars[i - 1].is_alphanumeric() || chars[i - 1] == '_' || chars[i - 1] == '#');
            if preceding_ok {
                let mut j = i + 1;
                while j < len && is_tag_char(chars[j]) {
                    j += 1;
                }
                if j > i + 1 {
                    let tag: String = chars[i + 1..j].iter().collect();
                    out.push_str(&format!("[#{tag}](/-/tag/{tag})"));
                    i = j;
                    continue;
                }
            }
            out.push(c);
            i += 1;
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '/' || c == '-'
}

/// Find the index of the first `]]` at or after `from`.
fn find_close(chars: &[char], from: usize) -> Option<usize> {
    let len = chars.len();
    let mut j = from;
    while j + 1 < len {
        if chars[j] == ']' && chars[j + 1] == ']' {
            return Some(j);
        }
        j += 1;
    }
    None
}

/// Collect every wikilink target title reachable from metadata values,
/// recursing through sequences and mappings.
fn collect_metadata_link_targets(metadata: &IndexMap<String, Value>) -> Vec<String> {
    let mut strings = Vec::new();
    for v in metadata.values() {
        v.collect_strings(&mut strings);
    }
    let mut titles = Vec::new();
    for s in strings {
        for_each_wikilink_target(s, |t| {
            if !titles.contains(&t.to_string()) {
                titles.push(t.to_string());
            }
        });
    }
    titles
}

fn for_each_wikilink_target(s: &str, mut f: impl FnMut(&str)) {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let mut i = 0;
    while i < len {
        if chars[i] == '[' && i + 1 < len && chars[i + 1] == '[' {
            let triple_open = (i > 0 && chars[i - 1] == '[') || (i + 2 < len && chars[i + 2] == '[');
            if let Some(close) = find_close(&chars, i + 2) {
                let triple_close = close + 2 < len && chars[close + 2] == ']';
                if !triple_open && !triple_close {
                    let inner: String = chars[i + 2..close].iter().collect();
                    let target = inner.split_once('|').map(|(t, _)| t).unwrap_or(&inner);
                    let target = target.trim();
                    if !target.is_empty() {
                        f(target);
                    }
                    i = close + 2;
                    continue;
                }
            }
        }
        i += 1;
    }
}

/// Rewrite wikilinks found anywhere in metadata values, recursing through
/// sequences and mappings, leaving non-string scalars untouched.
fn rewrite_metadata_links(
    metadata: &IndexMap<String, Value>,
    resolve: &mut impl FnMut(&str) -> Option<String>,
) -> IndexMap<String, Value> {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), rewrite_value_links(v, resolve)))
        .collect()
}

fn rewrite_value_links(value: &Value, resolve: &mut impl FnMut(&str) -> Option<String>) -> Value {
    value.map_strings(&mut |s| {
        let mut linked = Vec::new();
        rewrite_string_links(s, resolve, &mut linked)
    })
}

fn rewrite_string_links(
    s: &str,
    resolve: &mut impl FnMut(&str) -> Option<String>,
    linked_titles: &mut Vec<String>,
) -> String {
    rewrite_line(s, resolve, linked_titles)
}
