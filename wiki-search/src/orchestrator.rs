//! Unified search orchestrator (spec §4.9): a synchronous "Phase A"
//! (title + heading lexical matches) followed by a streamed "Phase B"
//! (lazy semantic search plus an LLM answer over the combined results).
//!
//! This module is transport-agnostic: `phase_b` returns a plain
//! `Stream<Item = SearchEvent>`. The 15-second SSE keep-alive and the
//! wire-level event framing are `wiki-cli`'s job (axum's
//! `Sse::keep_alive`), not this orchestrator's.

use crate::traits::{Chat, PhaseAResults, Renderer};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use wiki_core::{Note, NotesService};
use wiki_embed::EmbeddingsManager;

const PROMPT_NOTE_LIMIT: usize = 10;
const PROMPT_SNIPPET_CHARS: usize = 600;
const SEMANTIC_CANDIDATE_K: usize = 10;
const SEMANTIC_RESULT_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub enum SearchEvent {
    SemanticResults(String),
    Token(String),
    Done,
    Error(String),
}

/// Phase A: first 5 title matches, then first 5 heading matches whose
/// notes weren't already surfaced by the title phase.
pub fn phase_a(service: &NotesService, query: &str) -> PhaseAResults {
    let title_matches = service.search_notes_by_filename(query, 5);
    let mut seen: indexmap::IndexSet<String> =
        title_matches.iter().map(|n| n.slug.clone()).collect();

    let all_heading_matches = service.search_notes_by_headings(query, 0);
    let mut heading_matches = Vec::new();
    for hm in all_heading_matches {
        if seen.contains(&hm.note_slug) {
            continue;
        }
        heading_matches.push(hm);
        if heading_matches.len() == SEMANTIC_RESULT_LIMIT {
            break;
        }
    }
    for hm in &heading_matches {
        seen.insert(hm.note_slug.clone());
    }

    PhaseAResults {
        query: query.to_string(),
        title_matches,
        heading_matches,
        seen,
    }
}

/// Spawns the Phase B pipeline and returns a stream of its events. The
/// task observes `cancel` at every await point (vector store call, chat
/// call, channel send) and exits early, leaving a partial event
/// sequence — acceptable per spec.
pub fn phase_b(
    service: Arc<NotesService>,
    embeddings: Option<Arc<EmbeddingsManager>>,
    chat: Option<Arc<dyn Chat>>,
    renderer: Arc<dyn Renderer>,
    phase_a: PhaseAResults,
    cancel: CancellationToken,
) -> UnboundedReceiverStream<SearchEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_phase_b(service, embeddings, chat, renderer, phase_a, cancel, tx));
    UnboundedReceiverStream::new(rx)
}

async fn run_phase_b(
    service: Arc<NotesService>,
    embeddings: Option<Arc<EmbeddingsManager>>,
    chat: Option<Arc<dyn Chat>>,
    renderer: Arc<dyn Renderer>,
    phase_a: PhaseAResults,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<SearchEvent>,
) {
    let mut seen = phase_a.seen.clone();
    let mut semantic_notes: Vec<Note> = Vec::new();

    if let Some(mgr) = &embeddings {
        mgr.initialize_lazily(service.clone());

        let store = mgr.vector_store();
        let search = store.similarity_search(&phase_a.query, SEMANTIC_CANDIDATE_K);
        let docs = tokio::select! {
            _ = cancel.cancelled() => return,
            result = search => result,
        };

        match docs {
            Ok(docs) => {
                for doc in docs {
                    if seen.contains(&doc.slug) {
                        continue;
                    }
                    if let Some(note) = service.get_note(&doc.slug) {
                        seen.insert(note.slug.clone());
                        semantic_notes.push(note);
                    }
                    if semantic_notes.len() == SEMANTIC_RESULT_LIMIT {
                        break;
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "semantic similarity search failed");
            }
        }

        let html = semantic_notes
            .iter()
            .map(|n| renderer.render_semantic_card(n))
            .collect::<Vec<_>>()
            .join("");
        if tx.send(SearchEvent::SemanticResults(html)).is_err() {
            return;
        }
    }

    if let Some(chat) = chat {
        let heading_notes: Vec<Note> = phase_a
            .heading_matches
            .iter()
            .filter_map(|hm| service.get_note(&hm.note_slug))
            .collect();

        let prompt_notes = dedup_by_slug(
            phase_a
                .title_matches
                .iter()
                .chain(heading_notes.iter())
                .chain(semantic_notes.iter()),
        );
        let prompt = build_prompt(&phase_a.query, &prompt_notes);

        let stream_result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = chat.stream(&prompt) => result,
        };

        match stream_result {
            Ok(mut tokens) => loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => return,
                    next = tokens.next() => next,
                };
                match next {
                    Some(Ok(chunk)) => {
                        if tx.send(SearchEvent::Token(chunk)).is_err() {
                            return;
                        }
                    }
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "chat stream failed");
                        let _ = tx.send(SearchEvent::Error(err.to_string()));
                        return;
                    }
                    None => break,
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to start chat stream");
                let _ = tx.send(SearchEvent::Error(err.to_string()));
                return;
            }
        }
    }

    let _ = tx.send(SearchEvent::Done);
}

fn dedup_by_slug<'a>(notes: impl Iterator<Item = &'a Note>) -> Vec<&'a Note> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for note in notes {
        if seen.insert(note.slug.clone()) {
            out.push(note);
        }
        if out.len() == PROMPT_NOTE_LIMIT {
            break;
        }
    }
    out
}

fn build_prompt(query: &str, notes: &[&Note]) -> String {
    let mut body = String::new();
    for note in notes {
        let snippet: String = note.content.chars().take(PROMPT_SNIPPET_CHARS).collect();
        body.push_str(&format!("## {}\n{}\n\n", note.title, snippet));
    }
    format!(
        "You are answering a question using only the notes below.\n\n{body}Question: {query}\nAnswer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RenderContext;
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use indexmap::IndexMap;
    use wiki_embed::{EmbeddingsTracker, VectorDocument, VectorStore};
    use wiki_core::{Snapshot, TreeNode};

    fn note(slug: &str, title: &str, content: &str) -> Note {
        Note {
            title: title.to_string(),
            slug: slug.to_string(),
            path: format!("{slug}.md"),
            content: content.to_string(),
            metadata: IndexMap::new(),
            is_public: true,
            referenced_by: Vec::new(),
        }
    }

    struct FakeRenderer;
    impl Renderer for FakeRenderer {
        fn render_note_page(&self, _note: &Note, _ctx: &RenderContext) -> String {
            String::new()
        }
        fn render_tag_page(&self, _tag: &str, _notes: &[Note]) -> String {
            String::new()
        }
        fn render_search_page(&self, _phase_a: &PhaseAResults) -> String {
            String::new()
        }
        fn render_semantic_card(&self, note: &Note) -> String {
            format!("<card>{}</card>", note.slug)
        }
        fn render_progress_snippet(&self, _status: &wiki_embed::EmbeddingProgressSnapshot) -> String {
            String::new()
        }
    }

    struct FakeStore {
        docs: Vec<VectorDocument>,
    }

    #[async_trait]
    impl VectorStore for FakeStore {
        async fn add_documents(&self, _docs: Vec<VectorDocument>) -> anyhow::Result<()> {
            Ok(())
        }
        async fn similarity_search(&self, _query: &str, _k: usize) -> anyhow::Result<Vec<VectorDocument>> {
            Ok(self.docs.clone())
        }
    }

    struct FakeChat;
    #[async_trait]
    impl Chat for FakeChat {
        async fn stream(&self, _prompt: &str) -> anyhow::Result<BoxStream<'static, anyhow::Result<String>>> {
            let s = futures::stream::iter(vec![Ok("hel".to_string()), Ok("lo".to_string())]);
            Ok(Box::pin(s))
        }
    }

    fn service_with(notes: Vec<Note>) -> Arc<NotesService> {
        let mut notes_by_slug = IndexMap::new();
        for n in notes {
            notes_by_slug.insert(n.slug.clone(), n);
        }
        Arc::new(NotesService::new(Snapshot {
            notes_by_slug,
            tree: TreeNode::root(),
            tag_index: IndexMap::new(),
            diagnostics: Vec::new(),
        }))
    }

    #[test]
    fn phase_a_excludes_title_matches_from_headings() {
        let service = service_with(vec![
            note("a", "Alpha", "# Alpha\nbody"),
            note("b", "Beta", "# Other\ntext about Alpha"),
        ]);
        let result = phase_a(&service, "Alpha");
        assert_eq!(result.title_matches.len(), 1);
        assert_eq!(result.title_matches[0].slug, "a");
        assert!(result.seen.contains("a"));
    }

    #[tokio::test]
    async fn phase_b_emits_semantic_results_then_tokens_then_done() {
        let service = service_with(vec![note("a", "Alpha", "body about alpha")]);
        let pa = PhaseAResults {
            query: "alpha".to_string(),
            title_matches: Vec::new(),
            heading_matches: Vec::new(),
            seen: indexmap::IndexSet::new(),
        };

        let tracker = EmbeddingsTracker::load(std::path::Path::new("/does/not/exist"), "m").unwrap();
        let store: Arc<dyn VectorStore> = Arc::new(FakeStore {
            docs: vec![VectorDocument {
                page_content: String::new(),
                slug: "a".to_string(),
                title: "Alpha".to_string(),
                path: "a.md".to_string(),
            }],
        });
        let manager = Arc::new(EmbeddingsManager::new(
            store,
            tracker,
            std::path::PathBuf::from("/tmp/does-not-matter.json"),
            CancellationToken::new(),
        ));

        let mut stream = phase_b(
            service,
            Some(manager),
            Some(Arc::new(FakeChat)),
            Arc::new(FakeRenderer),
            pa,
            CancellationToken::new(),
        );

        let mut events = Vec::new();
        while let Some(ev) = stream.next().await {
            events.push(ev);
        }

        assert!(matches!(events[0], SearchEvent::SemanticResults(ref h) if h.contains("<card>a</card>")));
        assert!(matches!(events[1], SearchEvent::Token(ref t) if t == "hel"));
        assert!(matches!(events[2], SearchEvent::Token(ref t) if t == "lo"));
        assert!(matches!(events[3], SearchEvent::Done));
    }

    #[tokio::test]
    async fn phase_b_skips_semantic_without_embeddings_manager() {
        let service = service_with(vec![note("a", "Alpha", "body")]);
        let pa = PhaseAResults {
            query: "alpha".to_string(),
            title_matches: Vec::new(),
            heading_matches: Vec::new(),
            seen: indexmap::IndexSet::new(),
        };

        let mut stream = phase_b(service, None, None, Arc::new(FakeRenderer), pa, CancellationToken::new());
        let mut events = Vec::new();
        while let Some(ev) = stream.next().await {
            events.push(ev);
        }
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SearchEvent::Done));
    }

    #[test]
    fn prompt_includes_query_and_note_titles() {
        let a = note("a", "Alpha", "alpha content");
        let b = note("b", "Beta", "beta content");
        let refs = vec![&a, &b];
        let prompt = build_prompt("what is alpha", &refs);
        assert!(prompt.contains("Alpha"));
        assert!(prompt.contains("Beta"));
        assert!(prompt.contains("what is alpha"));
    }
}
