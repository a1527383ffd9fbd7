//! Collaborator traits: the boundary between the core embedding/search
//! pipeline and whatever concrete model/vector-store backs a deployment.
//! `wiki-cli` supplies default in-process implementations; tests supply
//! fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A document as stored in / returned from a `VectorStore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    pub page_content: String,
    pub slug: String,
    pub title: String,
    pub path: String,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    fn model_identifier(&self) -> &str;
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add_documents(&self, docs: Vec<VectorDocument>) -> anyhow::Result<()>;
    async fn similarity_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<VectorDocument>>;
}
