//! Demo axum server wiring `wiki-core`, `wiki-watch`, `wiki-embed` and
//! `wiki-search` together. Registers the three routes named in spec §6
//! plus a couple of convenience page routes so the `Renderer` is
//! exercised end to end.

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{header, HeaderName};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt as _;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use wiki_core::NotesService;
use wiki_embed::EmbeddingsManager;
use wiki_search::{phase_a, phase_b, Chat, RenderContext, Renderer, SearchEvent};

#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<NotesService>,
    pub embeddings: Arc<EmbeddingsManager>,
    pub chat: Option<Arc<dyn Chat>>,
    pub renderer: Arc<dyn Renderer>,
    pub home_slug: String,
    pub cancel: CancellationToken,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_page))
        .route("/-/search", get(search_page))
        .route("/-/search-stream", get(search_stream))
        .route("/-/embedding-progress", get(embedding_progress_stream))
        .route("/{slug}", get(note_page))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn home_page(State(state): State<AppState>) -> Response {
    note_page(AxumPath(state.home_slug.clone()), State(state.clone())).await
}

async fn note_page(AxumPath(slug): AxumPath<String>, State(state): State<AppState>) -> Response {
    match state.notes.get_note(&slug) {
        Some(note) => {
            let ctx = RenderContext {
                home_slug: Some(state.home_slug.clone()),
            };
            Html(state.renderer.render_note_page(&note, &ctx)).into_response()
        }
        None => (axum::http::StatusCode::NOT_FOUND, "note not found").into_response(),
    }
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

/// `GET /-/search?q=<query>` — Phase A, synchronous.
async fn search_page(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.q.unwrap_or_default();
    let results = phase_a(&state.notes, &query);
    Html(state.renderer.render_search_page(&results)).into_response()
}

#[derive(Deserialize)]
struct SearchStreamParams {
    q: Option<String>,
    seen: Option<String>,
}

/// `GET /-/search-stream?q=<query>&seen=<slug,slug,...>` — Phase B, SSE.
///
/// Phase A selection (5 title matches, then 5 non-overlapping heading
/// matches) lives in `wiki_search::phase_a` alone, shared with
/// `search_page`; this handler only overlays the client-supplied `seen`
/// CSV on top so Phase B doesn't re-surface notes the page already
/// rendered in Phase A.
async fn search_stream(
    State(state): State<AppState>,
    Query(params): Query<SearchStreamParams>,
) -> impl IntoResponse {
    let query = params.q.unwrap_or_default();
    let mut phase_a_results = phase_a(&state.notes, &query);
    if let Some(csv) = params.seen {
        phase_a_results
            .seen
            .extend(csv.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from));
    }

    let events = phase_b(
        state.notes.clone(),
        Some(state.embeddings.clone()),
        state.chat.clone(),
        state.renderer.clone(),
        phase_a_results,
        state.cancel.child_token(),
    );

    let sse_events = events.map(|ev| Ok(to_sse_event(ev)));
    let sse = Sse::new(sse_events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keep-alive"));

    (
        [
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        sse,
    )
}

fn to_sse_event(ev: SearchEvent) -> Event {
    match ev {
        SearchEvent::SemanticResults(html) => Event::default().event("semantic-results").data(html),
        SearchEvent::Token(chunk) => Event::default().event("token").data(chunk),
        SearchEvent::Done => Event::default().event("done").data("Complete"),
        SearchEvent::Error(msg) => Event::default().event("error").data(msg),
    }
}

/// `GET /-/embedding-progress` — emits the rendered progress snippet on
/// every change, and at least once every 10 seconds.
async fn embedding_progress_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let renderer = state.renderer.clone();
    let rx = state.embeddings.progress().subscribe();

    let stream = futures::stream::unfold((rx, renderer), |(mut rx, renderer)| async move {
        let snapshot = rx.borrow_and_update().clone();
        let event = Event::default().data(renderer.render_progress_snippet(&snapshot));

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return None;
                }
            }
            _ = tokio::time::sleep(Duration::from_secs(10)) => {}
        }

        Some((Ok(event), (rx, renderer)))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(10)).text("keep-alive"))
}
