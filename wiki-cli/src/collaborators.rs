//! Default, in-process implementations of the collaborator traits, wired
//! up so the workspace runs end to end without an external vector store
//! or chat model. `NullEmbedder`/`NullChat` stand in when no model
//! endpoint is configured — per spec, that makes the "missing
//! VectorStore/Chat → phase skipped" failure policy observable even in
//! this demo binary, not just in unit tests.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::sync::RwLock;
use wiki_core::{HeadingMatch, Note};
use wiki_embed::{Embedder, EmbeddingProgressSnapshot, VectorDocument, VectorStore};
use wiki_search::{Chat, PhaseAResults, RenderContext, Renderer};

/// Produces no real embedding. A `VectorStore` backed by this never
/// actually matches anything, but the request/event pipeline still runs
/// end to end.
pub struct NullEmbedder;

#[async_trait]
impl Embedder for NullEmbedder {
    async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(Vec::new())
    }

    fn model_identifier(&self) -> &str {
        "null"
    }
}

/// Completes immediately with no tokens.
pub struct NullChat;

#[async_trait]
impl Chat for NullChat {
    async fn stream(&self, _prompt: &str) -> anyhow::Result<BoxStream<'static, anyhow::Result<String>>> {
        Ok(Box::pin(futures::stream::empty()))
    }
}

/// Brute-force cosine-similarity vector store over an in-memory
/// `Vec<(VectorDocument, Vec<f32>)>`, grounded on the feature-hashing
/// embedder + cosine-similarity search pattern common to small local
/// semantic-search tools. Documents whose embedding comes back empty
/// (the `NullEmbedder` case) are kept out of the index entirely, so a
/// misconfigured deployment degrades to "no semantic matches" rather
/// than panicking on a dimension mismatch.
pub struct InMemoryVectorStore {
    embedder: Arc<dyn Embedder>,
    documents: RwLock<Vec<(VectorDocument, Vec<f32>)>>,
}

impl InMemoryVectorStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        InMemoryVectorStore {
            embedder,
            documents: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add_documents(&self, docs: Vec<VectorDocument>) -> anyhow::Result<()> {
        for doc in docs {
            let embedding = self.embedder.embed(&doc.page_content).await?;
            if embedding.is_empty() {
                continue;
            }
            self.documents
                .write()
                .expect("vector store lock poisoned")
                .push((doc, embedding));
        }
        Ok(())
    }

    async fn similarity_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<VectorDocument>> {
        let query_embedding = self.embedder.embed(query).await?;
        if query_embedding.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.documents.read().expect("vector store lock poisoned");
        let mut scored: Vec<(f32, &VectorDocument)> = docs
            .iter()
            .map(|(doc, emb)| (cosine_similarity(&query_embedding, emb), doc))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored.into_iter().map(|(_, doc)| doc.clone()).collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Emits minimal inline-styled HTML. Intentionally not the "real" theme
/// for this demo binary.
pub struct MinimalRenderer;

impl Renderer for MinimalRenderer {
    fn render_note_page(&self, note: &Note, _ctx: &RenderContext) -> String {
        format!(
            "<article style=\"font-family:sans-serif;max-width:40rem;margin:2rem auto\">\
             <h1>{}</h1><pre style=\"white-space:pre-wrap\">{}</pre></article>",
            html_escape(&note.title),
            html_escape(&note.content)
        )
    }

    fn render_tag_page(&self, tag: &str, notes: &[Note]) -> String {
        let items: String = notes
            .iter()
            .map(|n| format!("<li><a href=\"/{}\">{}</a></li>", n.slug, html_escape(&n.title)))
            .collect();
        format!(
            "<section><h1>#{}</h1><ul>{}</ul></section>",
            html_escape(tag),
            items
        )
    }

    fn render_search_page(&self, phase_a: &PhaseAResults) -> String {
        let title_html: String = phase_a
            .title_matches
            .iter()
            .map(|n| format!("<li><a href=\"/{}\">{}</a></li>", n.slug, html_escape(&n.title)))
            .collect();
        let heading_html: String = phase_a
            .heading_matches
            .iter()
            .map(render_heading_match)
            .collect();
        format!(
            "<section style=\"font-family:sans-serif\"><h1>Search: {}</h1>\
             <h2>Titles</h2><ul>{}</ul><h2>Headings</h2><ul>{}</ul>\
             <div id=\"semantic-results\"></div></section>",
            html_escape(&phase_a.query),
            title_html,
            heading_html
        )
    }

    fn render_semantic_card(&self, note: &Note) -> String {
        format!(
            "<div class=\"semantic-card\"><a href=\"/{}\">{}</a></div>",
            note.slug,
            html_escape(&note.title)
        )
    }

    fn render_progress_snippet(&self, status: &EmbeddingProgressSnapshot) -> String {
        if status.is_embedding {
            format!(
                "<div id=\"embedding-progress\">Embedding {}/{}{}</div>",
                status.embedded,
                status.total,
                status
                    .current_note
                    .as_ref()
                    .map(|n| format!(" ({})", html_escape(n)))
                    .unwrap_or_default()
            )
        } else {
            "<div id=\"embedding-progress\">Idle</div>".to_string()
        }
    }
}

fn render_heading_match(hm: &HeadingMatch) -> String {
    format!(
        "<li><a href=\"/{}#{}\">{}</a> — {}</li>",
        hm.note_slug,
        hm.line_number,
        html_escape(&hm.heading),
        html_escape(&hm.context)
    )
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_embedder_yields_empty_vector() {
        let e = NullEmbedder;
        assert!(e.embed("anything").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_with_null_embedder_never_matches() {
        let store = InMemoryVectorStore::new(Arc::new(NullEmbedder));
        store
            .add_documents(vec![VectorDocument {
                page_content: "hello".to_string(),
                slug: "a".to_string(),
                title: "A".to_string(),
                path: "a.md".to_string(),
            }])
            .await
            .unwrap();
        let results = store.similarity_search("hello", 5).await.unwrap();
        assert!(results.is_empty());
    }

    struct FakeEmbedder;
    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }
        fn model_identifier(&self) -> &str {
            "fake"
        }
    }

    #[tokio::test]
    async fn store_with_real_embedder_ranks_by_similarity() {
        let store = InMemoryVectorStore::new(Arc::new(FakeEmbedder));
        store
            .add_documents(vec![
                VectorDocument {
                    page_content: "short".to_string(),
                    slug: "short".to_string(),
                    title: "Short".to_string(),
                    path: "short.md".to_string(),
                },
                VectorDocument {
                    page_content: "a much longer document body".to_string(),
                    slug: "long".to_string(),
                    title: "Long".to_string(),
                    path: "long.md".to_string(),
                },
            ])
            .await
            .unwrap();

        let results = store.similarity_search("short", 1).await.unwrap();
        assert_eq!(results[0].slug, "short");
    }

    #[test]
    fn renderer_escapes_html_in_title() {
        let renderer = MinimalRenderer;
        let note = Note {
            title: "<script>".to_string(),
            slug: "s".to_string(),
            path: "s.md".to_string(),
            content: String::new(),
            metadata: indexmap::IndexMap::new(),
            is_public: true,
            referenced_by: Vec::new(),
        };
        let html = renderer.render_note_page(&note, &RenderContext::default());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
