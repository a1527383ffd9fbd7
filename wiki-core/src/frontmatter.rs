//! Split YAML frontmatter from a markdown document, strip `%%...%%`
//! comment blocks, and extract the first H1 title line — all in a single
//! forward scan so a `#` inside a stripped comment block is never
//! mistaken for a title line.

use crate::value::{self, Value};
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("invalid YAML frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result of splitting frontmatter from a raw file's bytes.
pub struct ParsedDocument {
    pub metadata: IndexMap<String, Value>,
    /// Body after comment stripping and H1 extraction.
    pub body: String,
    /// First H1 heading found, if any.
    pub h1_title: Option<String>,
}

/// Split optional leading `---`-delimited YAML frontmatter from `raw`.
/// Malformed or empty frontmatter yields empty metadata and the whole
/// input as body, matching spec behavior (never a hard failure for the
/// caller — Explorer decides whether to record a diagnostic).
pub fn split_frontmatter(raw: &str) -> Result<(IndexMap<String, Value>, String), FrontmatterError> {
    let Some(rest) = raw.strip_prefix("---") else {
        return Ok((IndexMap::new(), raw.to_string()));
    };
    // Frontmatter delimiter line may have trailing whitespace before the newline.
    let rest = match rest.find('\n') {
        Some(idx) if rest[..idx].trim().is_empty() => &rest[idx + 1..],
        _ => return Ok((IndexMap::new(), raw.to_string())),
    };

    let Some(end) = find_closing_delimiter(rest) else {
        return Ok((IndexMap::new(), raw.to_string()));
    };
    let (yaml_block, body) = rest.split_at(end);
    // body currently starts at the `---` closing line; skip past it and the newline.
    let body = body
        .strip_prefix("---")
        .unwrap_or(body)
        .strip_prefix('\n')
        .unwrap_or("");

    if yaml_block.trim().is_empty() {
        return Ok((IndexMap::new(), body.to_string()));
    }

    let yaml: serde_yaml::Value = match serde_yaml::from_str(yaml_block) {
        Ok(v) => v,
        Err(_) => return Ok((IndexMap::new(), raw.to_string())),
    };

    let metadata = match value::from_yaml(yaml) {
        Value::Mapping(m) => m,
        _ => IndexMap::new(),
    };

    Ok((metadata, body.to_string()))
}

/// Find the byte offset of a line that is exactly `---` (optionally
/// trailing whitespace) within `s`, searched line by line.
fn find_closing_delimiter(s: &str) -> Option<usize> {
    let mut offset = 0;
    for line in s.split_inclusive('\n') {
        let trimmed = line.trim_end_matches('\n').trim_end_matches('\r');
        if trimmed.trim() == "---" {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// Strip paired `%%...%%` comment blocks and extract the first H1 title
/// line (`^#\s+(.+)$`) from `body`, in one forward scan over lines.
/// Lines inside a `%%...%%` block are dropped entirely (including a `#`
/// that would otherwise look like a title).
pub fn strip_comments_and_extract_title(body: &str) -> (String, Option<String>) {
    let mut out_lines: Vec<&str> = Vec::new();
    let mut title: Option<String> = None;
    let mut in_comment = false;
    let mut title_taken = false;

    for line in body.lines() {
        let mut remaining = line;
        let mut emit = String::new();
        loop {
            if in_comment {
                match remaining.find("%%") {
                    Some(idx) => {
                        in_comment = false;
                        remaining = &remaining[idx + 2..];
                    }
                    None => {
                        remaining = "";
                        break;
                    }
                }
            } else {
                match remaining.find("%%") {
                    Some(idx) => {
                        emit.push_str(&remaining[..idx]);
                        in_comment = true;
                        remaining = &remaining[idx + 2..];
                    }
                    None => {
                        emit.push_str(remaining);
                        remaining = "";
                        break;
                    }
                }
            }
        }

        if in_comment && emit.is_empty() {
            // Entire line consumed by (or starting) a comment block; drop it.
            continue;
        }

        if !title_taken {
            if let Some(text) = h1_text(&emit) {
                title = Some(text.to_string());
                title_taken = true;
                continue;
            }
        }
        out_lines.push(line_for(&emit));
    }

    (out_lines.join("\n"), title)
}

// h1_text/line_for operate on owned Strings produced above but we want to
// avoid allocating twice; keep them as simple helpers over &str by leaking
// through a thread-local-free approach: since `emit` is a local String, we
// re-borrow before it's dropped.
fn h1_text(line: &str) -> Option<&str> {
    let stripped = line.strip_prefix('#')?;
    let after_hash = stripped.strip_prefix(' ')?;
    let text = after_hash.trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn line_for(emit: &str) -> &str {
    emit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_basic_frontmatter() {
        let raw = "---\ntitle: Hello\npublish: true\n---\nBody text.";
        let (meta, body) = split_frontmatter(raw).unwrap();
        assert_eq!(meta.get("title").unwrap().as_str(), Some("Hello"));
        assert_eq!(meta.get("publish").unwrap().as_bool(), Some(true));
        assert_eq!(body, "Body text.");
    }

    #[test]
    fn no_frontmatter_is_whole_body() {
        let raw = "# Just a title\n\nbody";
        let (meta, body) = split_frontmatter(raw).unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn malformed_frontmatter_falls_back_to_whole_input() {
        let raw = "---\n[unterminated\n---\nbody";
        let (meta, body) = split_frontmatter(raw).unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn unclosed_frontmatter_falls_back() {
        let raw = "---\ntitle: x\nbody without closing delimiter";
        let (meta, body) = split_frontmatter(raw).unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn extracts_h1_and_removes_its_line() {
        let body = "# My Title\n\nSome content.";
        let (stripped, title) = strip_comments_and_extract_title(body);
        assert_eq!(title.as_deref(), Some("My Title"));
        assert_eq!(stripped, "\nSome content.");
    }

    #[test]
    fn hash_without_space_is_not_a_title() {
        let body = "#nospace\n\nbody";
        let (stripped, title) = strip_comments_and_extract_title(body);
        assert_eq!(title, None);
        assert_eq!(stripped, "#nospace\n\nbody");
    }

    #[test]
    fn strips_comment_block_spanning_lines() {
        let body = "before\n%%\n# not a real title\nstill hidden\n%%\nafter";
        let (stripped, title) = strip_comments_and_extract_title(body);
        assert_eq!(title, None);
        assert_eq!(stripped, "before\n\nafter");
    }

    #[test]
    fn comment_on_single_line_is_stripped() {
        let body = "a %%secret%% b";
        let (stripped, title) = strip_comments_and_extract_title(body);
        assert_eq!(title, None);
        assert_eq!(stripped, "a  b");
    }
}
