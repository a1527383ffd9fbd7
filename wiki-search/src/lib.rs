//! # wiki-search
//!
//! H1's semantic half: the unified SSE search orchestrator (Phase A
//! lexical, Phase B semantic + LLM), plus the `Chat`/`Renderer`
//! collaborator traits. Lexical search itself lives in `wiki-core` and
//! is re-exported here for convenience.

pub mod orchestrator;
pub mod traits;

pub use orchestrator::{phase_a, phase_b, SearchEvent};
pub use traits::{Chat, PhaseAResults, RenderContext, Renderer};
pub use wiki_core::search::{search_by_filename, search_by_headings};
