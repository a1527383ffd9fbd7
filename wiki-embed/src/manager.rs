//! M4: `EmbeddingsManager` — owns the tracker, the `VectorStore`, and a
//! once-only initialization latch. The first call to `initialize_lazily`
//! spawns the background embedding task; every later call is a no-op.

use crate::progress::{EmbeddingProgress, EmbeddingProgressSnapshot};
use crate::tracker::EmbeddingsTracker;
use crate::traits::{VectorStore, VectorDocument};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use wiki_core::NotesService;

pub struct EmbeddingsManager {
    vector_store: Arc<dyn VectorStore>,
    tracker: Mutex<EmbeddingsTracker>,
    tracker_path: PathBuf,
    progress: Arc<EmbeddingProgress>,
    started: AtomicBool,
    cancel: CancellationToken,
}

impl EmbeddingsManager {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        tracker: EmbeddingsTracker,
        tracker_path: PathBuf,
        cancel: CancellationToken,
    ) -> Self {
        EmbeddingsManager {
            vector_store,
            tracker: Mutex::new(tracker),
            tracker_path,
            progress: Arc::new(EmbeddingProgress::new()),
            started: AtomicBool::new(false),
            cancel,
        }
    }

    pub fn progress(&self) -> Arc<EmbeddingProgress> {
        self.progress.clone()
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    pub fn progress_snapshot(&self) -> EmbeddingProgressSnapshot {
        self.progress.current()
    }

    /// Idempotent: only the first call spawns the background task.
    /// Re-initialization after a vault reload is deliberately not
    /// automatic; subsequent edits are captured on the next lazy
    /// re-evaluation.
    pub fn initialize_lazily(self: &Arc<Self>, notes: Arc<NotesService>) {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let manager = self.clone();
        tokio::spawn(async move {
            manager.run_embedding_pass(notes).await;
        });
    }

    async fn run_embedding_pass(&self, notes: Arc<NotesService>) {
        let all_notes = notes.get_all_notes();
        let pending: Vec<_> = {
            let tracker = self.tracker.lock().await;
            all_notes
                .into_iter()
                .filter(|n| tracker.needs_embedding(n))
                .collect()
        };

        let total = pending.len();
        self.progress.publish(EmbeddingProgressSnapshot {
            embedded: 0,
            total,
            current_note: None,
            is_embedding: total > 0,
        });

        let mut embedded = 0;
        for note in pending {
            if self.cancel.is_cancelled() {
                tracing::info!(embedded, total, "embedding pass cancelled");
                break;
            }

            let doc = VectorDocument {
                page_content: format!("# {}\n\n{}", note.title, note.content),
                slug: note.slug.clone(),
                title: note.title.clone(),
                path: note.path.clone(),
            };

            match self.vector_store.add_documents(vec![doc]).await {
                Ok(()) => {
                    let mut tracker = self.tracker.lock().await;
                    tracker.mark_embedded(&note, Utc::now());
                    embedded += 1;
                }
                Err(err) => {
                    tracing::warn!(error = %err, slug = %note.slug, "failed to embed note");
                }
            }

            self.progress.publish(EmbeddingProgressSnapshot {
                embedded,
                total,
                current_note: Some(note.title.clone()),
                is_embedding: true,
            });
        }

        {
            let tracker = self.tracker.lock().await;
            if let Err(err) = tracker.save(&self.tracker_path) {
                tracing::error!(error = %err, "failed to persist embeddings tracker");
            }
        }

        self.progress.publish(EmbeddingProgressSnapshot {
            embedded,
            total,
            current_note: None,
            is_embedding: false,
        });
    }
}
