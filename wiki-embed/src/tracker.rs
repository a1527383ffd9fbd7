//! M3: `EmbeddingsTracker` — content-hash bookkeeping so the embedding
//! manager only re-embeds notes whose `title + content` actually changed.
//! Persisted as JSON, written atomically via a same-directory temp file
//! swapped into place.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;
use wiki_core::{EmbeddedFile, Note};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("failed to read tracker file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tracker file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to persist tracker file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrackerFile {
    model: String,
    files: IndexMap<String, EmbeddedFile>,
}

/// Content-hash ledger of which notes have already been embedded under
/// the current model. Mutated only by the embedding background task.
#[derive(Debug, Clone)]
pub struct EmbeddingsTracker {
    model: String,
    files: IndexMap<String, EmbeddedFile>,
}

impl EmbeddingsTracker {
    /// Load `path` against `current_model`. Missing file yields an empty
    /// tracker pinned to `current_model`. A model mismatch clears every
    /// entry (and logs a warning) rather than mixing embeddings from two
    /// models.
    pub fn load(path: &Path, current_model: &str) -> Result<Self, TrackerError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(EmbeddingsTracker {
                    model: current_model.to_string(),
                    files: IndexMap::new(),
                });
            }
            Err(source) => {
                return Err(TrackerError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        let parsed: TrackerFile = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(source) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "tracker file is corrupt, starting from an empty tracker"
                );
                return Ok(EmbeddingsTracker {
                    model: current_model.to_string(),
                    files: IndexMap::new(),
                });
            }
        };

        if parsed.model != current_model {
            tracing::warn!(
                old_model = %parsed.model,
                new_model = %current_model,
                "embedding model changed, clearing tracker"
            );
            return Ok(EmbeddingsTracker {
                model: current_model.to_string(),
                files: IndexMap::new(),
            });
        }

        Ok(EmbeddingsTracker {
            model: parsed.model,
            files: parsed.files,
        })
    }

    /// `true` iff `note` has no entry, or its entry's hash no longer
    /// matches `hash(note.title + "\n" + note.content)`.
    pub fn needs_embedding(&self, note: &Note) -> bool {
        let current_hash = content_hash(note);
        match self.files.get(&note.path) {
            Some(entry) => entry.content_hash != current_hash,
            None => true,
        }
    }

    pub fn mark_embedded(&mut self, note: &Note, last_modified: DateTime<Utc>) {
        self.files.insert(
            note.path.clone(),
            EmbeddedFile {
                path: note.path.clone(),
                content_hash: content_hash(note),
                embedded_at: Utc::now(),
                last_modified,
            },
        );
    }

    pub fn save(&self, path: &Path) -> Result<(), TrackerError> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir),
            None => tempfile::NamedTempFile::new(),
        }
        .map_err(|source| TrackerError::Write {
            path: path.display().to_string(),
            source,
        })?;

        let file = TrackerFile {
            model: self.model.clone(),
            files: self.files.clone(),
        };
        serde_json::to_writer_pretty(&mut tmp, &file).map_err(|source| TrackerError::Write {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, source),
        })?;

        tmp.persist(path).map_err(|err| TrackerError::Write {
            path: path.display().to_string(),
            source: err.error,
        })?;
        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn content_hash(note: &Note) -> String {
    let mut hasher = Sha256::new();
    hasher.update(note.title.as_bytes());
    hasher.update(b"\n");
    hasher.update(note.content.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{b:02x}").expect("writing to a String never fails");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap as Map;

    fn note(path: &str, title: &str, content: &str) -> Note {
        Note {
            title: title.to_string(),
            slug: title.to_lowercase(),
            path: path.to_string(),
            content: content.to_string(),
            metadata: Map::new(),
            is_public: true,
            referenced_by: Vec::new(),
        }
    }

    #[test]
    fn missing_file_yields_empty_tracker() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = EmbeddingsTracker::load(&dir.path().join("missing.json"), "model-a").unwrap();
        assert_eq!(tracker.model(), "model-a");
        assert!(tracker.is_empty());
    }

    #[test]
    fn new_note_needs_embedding() {
        let tracker = EmbeddingsTracker::load(Path::new("/does/not/exist"), "m").unwrap();
        let n = note("a.md", "A", "hello");
        assert!(tracker.needs_embedding(&n));
    }

    #[test]
    fn marked_note_no_longer_needs_embedding_until_changed() {
        let mut tracker = EmbeddingsTracker::load(Path::new("/does/not/exist"), "m").unwrap();
        let n = note("a.md", "A", "hello");
        tracker.mark_embedded(&n, Utc::now());
        assert!(!tracker.needs_embedding(&n));

        let changed = note("a.md", "A", "hello world");
        assert!(tracker.needs_embedding(&changed));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");

        let mut tracker = EmbeddingsTracker::load(&path, "model-a").unwrap();
        let n = note("a.md", "A", "hello");
        tracker.mark_embedded(&n, Utc::now());
        tracker.save(&path).unwrap();

        let reloaded = EmbeddingsTracker::load(&path, "model-a").unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(!reloaded.needs_embedding(&n));
    }

    #[test]
    fn corrupt_json_yields_empty_tracker_instead_of_erroring() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, "{ not valid json").unwrap();

        let tracker = EmbeddingsTracker::load(&path, "model-a").unwrap();
        assert_eq!(tracker.model(), "model-a");
        assert!(tracker.is_empty());
    }

    #[test]
    fn model_mismatch_clears_tracker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");

        let mut tracker = EmbeddingsTracker::load(&path, "model-a").unwrap();
        tracker.mark_embedded(&note("a.md", "A", "hello"), Utc::now());
        tracker.save(&path).unwrap();

        let reloaded = EmbeddingsTracker::load(&path, "model-b").unwrap();
        assert_eq!(reloaded.model(), "model-b");
        assert!(reloaded.is_empty());
    }
}
