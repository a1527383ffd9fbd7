//! M1: the concurrency boundary. `NotesService` holds the published
//! `(slug -> Note, tree, tag index)` triple behind a plain
//! `RwLock<Arc<Snapshot>>` — a shared read-mostly container with atomic
//! replacement, rather than a singleton with field-level locks. Readers
//! clone the `Arc` under a brief read lock; that clone is the
//! non-blocking, unlimited-reader operation the contract requires.

use crate::models::{Diagnostic, HeadingMatch, Note, TagIndex, TreeNode};
use crate::search;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

/// An immutable published index triple, plus the diagnostics collected
/// while building it.
#[derive(Clone)]
pub struct Snapshot {
    pub notes_by_slug: IndexMap<String, Note>,
    pub tree: TreeNode,
    pub tag_index: TagIndex,
    pub diagnostics: Vec<Diagnostic>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot {
            notes_by_slug: IndexMap::new(),
            tree: TreeNode::root(),
            tag_index: IndexMap::new(),
            diagnostics: Vec::new(),
        }
    }
}

pub struct NotesService {
    inner: RwLock<Arc<Snapshot>>,
}

impl NotesService {
    pub fn new(initial: Snapshot) -> Self {
        NotesService {
            inner: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn empty() -> Self {
        Self::new(Snapshot::empty())
    }

    /// Non-blocking for readers: clones the current `Arc` under a brief
    /// read lock.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.read().expect("notes service lock poisoned").clone()
    }

    /// Atomically install a new triple. The prior snapshot remains valid
    /// for already-started operations until its last `Arc` is dropped.
    pub fn swap(&self, new_snapshot: Snapshot) {
        let mut guard = self.inner.write().expect("notes service lock poisoned");
        *guard = Arc::new(new_snapshot);
    }

    pub fn get_note(&self, slug: &str) -> Option<Note> {
        self.snapshot().notes_by_slug.get(slug).cloned()
    }

    pub fn get_all_notes(&self) -> Vec<Note> {
        self.snapshot().notes_by_slug.values().cloned().collect()
    }

    pub fn get_tag_index(&self) -> TagIndex {
        self.snapshot().tag_index.clone()
    }

    pub fn get_tree(&self) -> TreeNode {
        self.snapshot().tree.clone()
    }

    pub fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.snapshot().diagnostics.clone()
    }

    /// The preferred home slug if present, else the first note
    /// (insertion order), else `None`.
    pub fn get_home_slug(&self, preferred: &str) -> Option<String> {
        let snap = self.snapshot();
        if snap.notes_by_slug.contains_key(preferred) {
            return Some(preferred.to_string());
        }
        snap.notes_by_slug.keys().next().cloned()
    }

    pub fn search_notes_by_filename(&self, query: &str, limit: usize) -> Vec<Note> {
        let snap = self.snapshot();
        let notes: Vec<Note> = snap.notes_by_slug.values().cloned().collect();
        search::search_by_filename(&notes, query, limit)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn search_notes_by_headings(&self, query: &str, limit: usize) -> Vec<HeadingMatch> {
        let snap = self.snapshot();
        let notes: Vec<Note> = snap.notes_by_slug.values().cloned().collect();
        search::search_by_headings(&notes, query, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BackReference;

    fn note(slug: &str) -> Note {
        Note {
            title: slug.to_string(),
            slug: slug.to_string(),
            path: format!("{slug}.md"),
            content: String::new(),
            metadata: IndexMap::new(),
            is_public: true,
            referenced_by: Vec::<BackReference>::new(),
        }
    }

    #[test]
    fn swap_replaces_snapshot_atomically() {
        let service = NotesService::empty();
        assert!(service.get_note("a").is_none());

        let mut notes_by_slug = IndexMap::new();
        notes_by_slug.insert("a".to_string(), note("a"));
        service.swap(Snapshot {
            notes_by_slug,
            tree: TreeNode::root(),
            tag_index: IndexMap::new(),
            diagnostics: Vec::new(),
        });

        assert!(service.get_note("a").is_some());
    }

    #[test]
    fn home_slug_prefers_configured_slug() {
        let service = NotesService::empty();
        let mut notes_by_slug = IndexMap::new();
        notes_by_slug.insert("other".to_string(), note("other"));
        notes_by_slug.insert("index".to_string(), note("index"));
        service.swap(Snapshot {
            notes_by_slug,
            tree: TreeNode::root(),
            tag_index: IndexMap::new(),
            diagnostics: Vec::new(),
        });

        assert_eq!(service.get_home_slug("index"), Some("index".to_string()));
        assert_eq!(service.get_home_slug("missing"), Some("other".to_string()));
    }
}
