//! H1 (lexical half): title/path search and heading search. The semantic
//! and SSE-orchestration layers live in the `wiki-search` crate, which
//! re-exports these for convenience.

use crate::models::{HeadingMatch, Note};

/// Case-insensitive substring match against title (score 2) and slug
/// (score 1). Empty query returns all notes. `limit == 0` means
/// unlimited.
pub fn search_by_filename<'a>(notes: &'a [Note], query: &str, limit: usize) -> Vec<&'a Note> {
    let q = query.to_lowercase();
    let mut scored: Vec<(i32, usize, &Note)> = notes
        .iter()
        .enumerate()
        .filter_map(|(idx, note)| {
            if q.is_empty() {
                return Some((0, idx, note));
            }
            let title = note.title.to_lowercase();
            let slug = note.slug.to_lowercase();
            let mut score = 0;
            if title.contains(&q) {
                score += 2;
            }
            if slug.contains(&q) {
                score += 1;
            }
            if score > 0 {
                Some((score, idx, note))
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut out: Vec<&Note> = scored.into_iter().map(|(_, _, n)| n).collect();
    if limit != 0 && out.len() > limit {
        out.truncate(limit);
    }
    out
}

const HEADING_CONTEXT_MAX_CHARS: usize = 75;

/// Scan each note's lines for `^\s*(#{1,6})\s+(.+)$` headings at level
/// 1–3, scoring matches against `query`.
pub fn search_by_headings(notes: &[Note], query: &str, limit: usize) -> Vec<HeadingMatch> {
    if query.is_empty() {
        return Vec::new();
    }
    let q = query.to_lowercase();
    let mut matches = Vec::new();

    for note in notes {
        let lines: Vec<&str> = note.content.lines().collect();
        for (line_idx, line) in lines.iter().enumerate() {
            let Some((level, heading_text)) = parse_heading(line) else {
                continue;
            };
            if level > 3 {
                continue;
            }
            let heading_lower = heading_text.to_lowercase();
            let base_score = if heading_lower == q {
                10
            } else if heading_lower.starts_with(&q) {
                5
            } else if heading_lower.contains(&q) {
                3
            } else {
                continue;
            };
            let level_bonus = 4 - level as i32;
            let context = build_context(&lines, line_idx + 1, HEADING_CONTEXT_MAX_CHARS);

            matches.push(HeadingMatch {
                note_slug: note.slug.clone(),
                note_title: note.title.clone(),
                heading: heading_text.to_string(),
                level,
                context,
                line_number: line_idx + 1,
                score: base_score + level_bonus,
            });
        }
    }

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    if limit != 0 && matches.len() > limit {
        matches.truncate(limit);
    }
    matches
}

fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    let text = rest.strip_prefix(' ')?.trim();
    if text.is_empty() {
        None
    } else {
        Some((hashes as u8, text))
    }
}

/// Join up to `max_chars` of subsequent non-empty, non-heading lines
/// (starting at `from_line`), truncating at a code-point boundary with
/// an ellipsis if needed.
fn build_context(lines: &[&str], from_line: usize, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for line in lines.iter().skip(from_line) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parse_heading(line).is_some() {
            break;
        }
        parts.push(trimmed);
    }
    let joined = parts.join(" ");
    truncate_chars(&joined, max_chars)
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars).collect();
    format!("{truncated}...")
}
