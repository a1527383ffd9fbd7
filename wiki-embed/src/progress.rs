//! Progress broadcast for the background embedding job. Backed by
//! `tokio::sync::watch`: single-slot, lossy by nature — exactly the
//! "slow subscribers drop old values" semantics the manager needs.

use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingProgressSnapshot {
    pub embedded: usize,
    pub total: usize,
    pub current_note: Option<String>,
    pub is_embedding: bool,
}

/// Owns the current snapshot and hands out `watch::Receiver`s. A
/// `Subscribe()` is just cloning the receiver; `Unsubscribe()` is
/// dropping it.
pub struct EmbeddingProgress {
    tx: watch::Sender<EmbeddingProgressSnapshot>,
}

impl EmbeddingProgress {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(EmbeddingProgressSnapshot::default());
        EmbeddingProgress { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<EmbeddingProgressSnapshot> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> EmbeddingProgressSnapshot {
        self.tx.borrow().clone()
    }

    pub fn publish(&self, snapshot: EmbeddingProgressSnapshot) {
        // No receivers is not an error: progress is fire-and-forget.
        let _ = self.tx.send(snapshot);
    }
}

impl Default for EmbeddingProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_sees_published_update() {
        let progress = EmbeddingProgress::new();
        let mut rx = progress.subscribe();

        progress.publish(EmbeddingProgressSnapshot {
            embedded: 1,
            total: 10,
            current_note: Some("a".to_string()),
            is_embedding: true,
        });

        assert!(rx.has_changed().unwrap());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.embedded, 1);
        assert_eq!(snap.total, 10);
    }

    #[test]
    fn current_reflects_last_publish_without_subscribing() {
        let progress = EmbeddingProgress::new();
        progress.publish(EmbeddingProgressSnapshot {
            embedded: 3,
            total: 3,
            current_note: None,
            is_embedding: false,
        });
        assert_eq!(progress.current().embedded, 3);
        assert!(!progress.current().is_embedding);
    }
}
