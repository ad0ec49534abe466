use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::SourceDocuments;

/// Text embedding backend. The same instance embeds chunks at build time and
/// claims at query time; vectors from different `embedder_id`s never mix.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g., `hashing:d384`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// One prompt sent to a reasoning backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub context_window: usize,
}

/// Language-model backend treated as `prompt -> text` that may fail.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn complete(&self, request: &ReasoningRequest) -> anyhow::Result<String>;
}

/// Supplies the raw documents for one evidence source.
pub trait SourceProvider: Send + Sync {
    fn source_ids(&self) -> anyhow::Result<Vec<String>>;
    fn documents(&self, source_id: &str) -> anyhow::Result<SourceDocuments>;
}
