//! Serve command: loads the vault, optionally starts the debounced
//! watcher, wires up the default in-process collaborators, and runs the
//! axum dev server until Ctrl+C.

use crate::collaborators::{InMemoryVectorStore, MinimalRenderer, NullChat, NullEmbedder};
use crate::server::{build_router, AppState};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiki_core::{Config, NotesService};
use wiki_embed::{EmbeddingsManager, EmbeddingsTracker};

pub async fn serve(config: &Config) -> Result<()> {
    let snapshot = wiki_core::load_vault(&config.vault_dir(), config.public_by_default);
    tracing::info!(notes = snapshot.notes_by_slug.len(), "vault loaded");
    let notes = Arc::new(NotesService::new(snapshot));

    let cancel = CancellationToken::new();

    let watcher = if config.watch {
        Some(
            wiki_watch::start(
                config.vault_dir(),
                notes.clone(),
                wiki_watch::DEFAULT_DEBOUNCE,
                cancel.clone(),
                config.public_by_default,
            )
            .context("failed to start vault watcher")?,
        )
    } else {
        None
    };

    let tracker_path = config.tracker_path();
    if let Some(dir) = tracker_path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;
    }
    let tracker_model = config.embedding.model_identifier.clone().unwrap_or_else(|| "null".to_string());
    let tracker = EmbeddingsTracker::load(&tracker_path, &tracker_model).context("failed to load embeddings tracker")?;
    let embedder = Arc::new(NullEmbedder);
    let vector_store = Arc::new(InMemoryVectorStore::new(embedder));
    let embeddings = Arc::new(EmbeddingsManager::new(
        vector_store,
        tracker,
        tracker_path,
        cancel.clone(),
    ));
    embeddings.initialize_lazily(notes.clone());

    // No real Chat backend ships with this demo binary: a configured
    // model identifier gets `NullChat` (so Phase B(c) runs but yields no
    // tokens), while an unconfigured one leaves `chat` at `None`, which
    // exercises the "missing Chat -> skip Phase B(c)" policy for real.
    let chat: Option<Arc<dyn wiki_search::Chat>> = config
        .embedding
        .chat_model_identifier
        .as_ref()
        .map(|_| Arc::new(NullChat) as Arc<dyn wiki_search::Chat>);

    let state = AppState {
        notes: notes.clone(),
        embeddings,
        chat,
        renderer: Arc::new(MinimalRenderer),
        home_slug: config.home_slug.clone(),
        cancel: cancel.clone(),
    };

    let app = build_router(state);
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %addr, "wiki-vault serving");
    println!("serving at http://{addr}");
    println!("press Ctrl+C to stop");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    if let Some(watcher) = watcher {
        watcher.shutdown().await;
    }

    serve_result.context("server error")
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
