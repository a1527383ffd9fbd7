//! M2: recursive, debounced filesystem watcher. On a settled burst of
//! filesystem events under the vault, reruns the full content pipeline
//! and atomically swaps the result into a `NotesService`.
//!
//! The debounce is a manual reset-on-event timer (`tokio::time::sleep`)
//! rather than `notify-debouncer-full`, so the exact 500 ms contract
//! stays explicit and testable.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use wiki_core::NotesService;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Handle to a running watcher; cancelling the token (or calling
/// `shutdown`) stops it and releases the underlying OS watch.
pub struct WatcherHandle {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl WatcherHandle {
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Start watching `vault_root` recursively. On every settled burst of
/// changes, runs `wiki_core::load_vault` and swaps the result into
/// `service`. Watcher errors are logged; the server keeps serving the
/// last good snapshot.
pub fn start(
    vault_root: PathBuf,
    service: Arc<NotesService>,
    debounce: Duration,
    cancel: CancellationToken,
    public_by_default: bool,
) -> Result<WatcherHandle> {
    let (tx, rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("failed to initialize filesystem watcher")?;

    watcher
        .watch(&vault_root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {vault_root:?}"))?;

    let task = tokio::spawn(run_loop(
        vault_root,
        service,
        watcher,
        rx,
        debounce,
        cancel.clone(),
        public_by_default,
    ));

    Ok(WatcherHandle { cancel, task })
}

async fn run_loop(
    vault_root: PathBuf,
    service: Arc<NotesService>,
    mut watcher: RecommendedWatcher,
    mut rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    debounce: Duration,
    cancel: CancellationToken,
    public_by_default: bool,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        let sleep_branch = async {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("watcher shutting down");
                return;
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(Ok(event)) => {
                        if is_hidden_event(&event, &vault_root) {
                            continue;
                        }
                        if matches!(event.kind, EventKind::Create(notify::event::CreateKind::Folder)) {
                            for path in &event.paths {
                                // notify's recursive mode already covers new
                                // subdirectories on most backends; re-issuing
                                // watch() here is defensive for backends that
                                // don't pick them up automatically.
                                if let Err(err) = watcher.watch(path, RecursiveMode::Recursive) {
                                    tracing::warn!(error = %err, path = %path.display(), "failed to watch new directory");
                                }
                            }
                        }
                        deadline = Some(Instant::now() + debounce);
                    }
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "watcher event error");
                    }
                    None => {
                        tracing::warn!("watcher channel closed");
                        return;
                    }
                }
            }
            _ = sleep_branch, if deadline.is_some() => {
                deadline = None;
                reload(&vault_root, &service, public_by_default).await;
            }
        }
    }
}

async fn reload(vault_root: &Path, service: &Arc<NotesService>, public_by_default: bool) {
    let root = vault_root.to_path_buf();
    let service = service.clone();
    let result =
        tokio::task::spawn_blocking(move || wiki_core::load_vault(&root, public_by_default)).await;
    match result {
        Ok(snapshot) => {
            tracing::info!(notes = snapshot.notes_by_slug.len(), "vault reloaded");
            service.swap(snapshot);
        }
        Err(err) => {
            tracing::error!(error = %err, "reload task panicked, keeping previous snapshot");
        }
    }
}

fn is_hidden_event(event: &Event, vault_root: &Path) -> bool {
    event.paths.iter().all(|p| path_is_hidden(p, vault_root))
}

fn path_is_hidden(path: &Path, vault_root: &Path) -> bool {
    let Ok(rel) = path.strip_prefix(vault_root) else {
        return false;
    };
    rel.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        s == "node_modules" || s == ".git" || (s.starts_with('.') && s != ".")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn reload_swaps_snapshot_on_file_change() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "---\npublish: true\n---\nOriginal").unwrap();

        let service = Arc::new(NotesService::empty());
        let cancel = CancellationToken::new();
        let handle = start(
            dir.path().to_path_buf(),
            service.clone(),
            Duration::from_millis(50),
            cancel.clone(),
            false,
        )
        .unwrap();

        tokio::time::sleep(StdDuration::from_millis(100)).await;
        fs::write(dir.path().join("a.md"), "---\npublish: true\n---\nChanged").unwrap();
        tokio::time::sleep(StdDuration::from_millis(400)).await;

        let note = service.get_note("a");
        assert!(note.is_some());

        handle.shutdown().await;
    }

    #[test]
    fn hidden_paths_are_filtered() {
        let root = Path::new("/vault");
        assert!(path_is_hidden(Path::new("/vault/.git/HEAD"), root));
        assert!(path_is_hidden(Path::new("/vault/node_modules/x"), root));
        assert!(!path_is_hidden(Path::new("/vault/notes/a.md"), root));
    }
}
