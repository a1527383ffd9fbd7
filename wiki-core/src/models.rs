//! Content model: notes, folder defaults, tree, tag index, diagnostics.

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single wikilink-style back-reference: the slug and title of a note
/// that links to the note owning this entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackReference {
    pub slug: String,
    pub title: String,
}

/// A parsed note, post content-pipeline. See `I1`–`I6` for the invariants
/// a published snapshot must uphold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Display title: first H1 in body, else frontmatter `title`, else
    /// filename without extension.
    pub title: String,
    /// URL-safe identifier, unique within a load.
    pub slug: String,
    /// Vault-relative original path; identity for persistence/tracking.
    pub path: String,
    /// Markdown body after frontmatter and H1-title-line removal.
    pub content: String,
    /// Arbitrary frontmatter metadata, order-preserving.
    pub metadata: IndexMap<String, Value>,
    pub is_public: bool,
    /// Insertion-ordered, deduplicated by target title.
    pub referenced_by: Vec<BackReference>,
}

impl Note {
    pub fn tags(&self) -> Vec<String> {
        match self.metadata.get("tags") {
            Some(Value::Scalar(s)) => s.as_str().map(|s| vec![s.to_string()]).unwrap_or_default(),
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Folder-level defaults parsed from a `.pluie` sidecar, keyed by
/// vault-relative folder path (no trailing slash).
#[derive(Debug, Clone, Default)]
pub struct FolderDefaults {
    pub by_folder: IndexMap<String, IndexMap<String, Value>>,
}

impl FolderDefaults {
    /// Resolve `publish` for `folder_path` by walking up to the root,
    /// most-specific folder wins.
    pub fn publish_for(&self, folder_path: &str) -> Option<bool> {
        let mut current = folder_path;
        loop {
            if let Some(meta) = self.by_folder.get(current) {
                if let Some(v) = meta.get("publish").and_then(Value::as_bool) {
                    return Some(v);
                }
            }
            match current.rsplit_once('/') {
                Some((parent, _)) => current = parent,
                None => {
                    if current.is_empty() {
                        return None;
                    }
                    current = "";
                }
            }
        }
    }
}

/// A node in the folder tree. Folders sort before notes; within a kind,
/// case-insensitive ascending by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub is_folder: bool,
    pub note: Option<Note>,
    pub children: Vec<TreeNode>,
    pub is_open: bool,
}

impl TreeNode {
    pub fn root() -> Self {
        TreeNode {
            name: String::new(),
            path: String::new(),
            is_folder: true,
            note: None,
            children: Vec::new(),
            is_open: true,
        }
    }
}

/// tag (lowercased, trimmed) -> notes that cite it, in discovery order.
pub type TagIndex = IndexMap<String, Vec<Note>>;

/// A heading-level lexical search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingMatch {
    pub note_slug: String,
    pub note_title: String,
    pub heading: String,
    pub level: u8,
    pub context: String,
    pub line_number: usize,
    pub score: i32,
}

/// A single tracked embedded file entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedFile {
    pub path: String,
    pub content_hash: String,
    pub embedded_at: chrono::DateTime<chrono::Utc>,
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Warning,
    Error,
}

/// Structured form of a logged-and-skipped condition encountered during a
/// load (parse failures, conflicting slugs, tracker corruption). Attached
/// to the snapshot that resulted from the load for introspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub note_slug: Option<String>,
    pub source_path: Option<String>,
}

impl Diagnostic {
    pub fn warn(code: &str, message: impl Into<String>) -> Self {
        Diagnostic {
            code: code.to_string(),
            message: message.into(),
            severity: DiagnosticSeverity::Warning,
            note_slug: None,
            source_path: None,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Diagnostic {
            code: code.to_string(),
            message: message.into(),
            severity: DiagnosticSeverity::Error,
            note_slug: None,
            source_path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.note_slug = Some(slug.into());
        self
    }
}
