//! Collaborator traits for the pieces the search orchestrator calls out
//! to but does not own the implementation of: a streaming chat model and
//! an HTML renderer. `wiki-cli` supplies the demo implementations.

use async_trait::async_trait;
use futures::stream::BoxStream;
use indexmap::IndexSet;
use wiki_core::{HeadingMatch, Note};
use wiki_embed::EmbeddingProgressSnapshot;

#[async_trait]
pub trait Chat: Send + Sync {
    async fn stream(&self, prompt: &str) -> anyhow::Result<BoxStream<'static, anyhow::Result<String>>>;
}

/// Phase A: the synchronous part of a search — first 5 title matches,
/// then first 5 heading matches whose notes weren't already surfaced by
/// the title phase. `seen` is the full set of slugs already shown, so
/// Phase B can filter semantic results against it.
#[derive(Debug, Clone)]
pub struct PhaseAResults {
    pub query: String,
    pub title_matches: Vec<Note>,
    pub heading_matches: Vec<HeadingMatch>,
    pub seen: IndexSet<String>,
}

/// Extra context a renderer may need beyond the note itself (e.g. the
/// current tag index, for sidebar links). Kept intentionally small.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub home_slug: Option<String>,
}

pub trait Renderer: Send + Sync {
    fn render_note_page(&self, note: &Note, ctx: &RenderContext) -> String;
    fn render_tag_page(&self, tag: &str, notes: &[Note]) -> String;
    fn render_search_page(&self, phase_a: &PhaseAResults) -> String;
    fn render_semantic_card(&self, note: &Note) -> String;
    fn render_progress_snippet(&self, status: &EmbeddingProgressSnapshot) -> String;
}
