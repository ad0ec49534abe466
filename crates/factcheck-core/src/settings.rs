//! Typed settings handed to each component at construction time.
//!
//! Every struct deserializes with defaults for missing keys and exposes a
//! `validate` that rejects out-of-range values before any backend is called.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::error::{Error, Result};

pub const CHUNK_SIZE_RANGE: RangeInclusive<usize> = 50..=1000;
pub const CHUNK_OVERLAP_RANGE: RangeInclusive<usize> = 0..=100;
pub const TOP_K_RANGE: RangeInclusive<usize> = 1..=20;
pub const MIN_SIMILARITY_RANGE: RangeInclusive<f32> = 0.1..=1.0;

/// Placeholder substituted with the claim text in query and prompt templates.
pub const CLAIM_PLACEHOLDER: &str = "{claim}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Words per chunk.
    pub chunk_size: usize,
    /// Words shared with the preceding chunk.
    pub chunk_overlap: usize,
    pub embed_batch_size: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 150, chunk_overlap: 20, embed_batch_size: 256 }
    }
}

impl ChunkingSettings {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !CHUNK_SIZE_RANGE.contains(&self.chunk_size) {
            return Err(Error::config(format!(
                "chunk_size {} outside {:?}",
                self.chunk_size, CHUNK_SIZE_RANGE
            )));
        }
        if !CHUNK_OVERLAP_RANGE.contains(&self.chunk_overlap) {
            return Err(Error::config(format!(
                "chunk_overlap {} outside {:?}",
                self.chunk_overlap, CHUNK_OVERLAP_RANGE
            )));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap {} must be smaller than chunk_size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embed_batch_size == 0 {
            return Err(Error::config("embed_batch_size must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub min_similarity: f32,
    /// Retrieval query built from the claim, e.g. `"evidence against: {claim}"`.
    pub query_template: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 8, min_similarity: 0.75, query_template: CLAIM_PLACEHOLDER.to_string() }
    }
}

impl RetrievalSettings {
    pub fn new(top_k: usize, min_similarity: f32) -> Self {
        Self { top_k, min_similarity, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        validate_query(self.top_k, self.min_similarity)?;
        if !self.query_template.contains(CLAIM_PLACEHOLDER) {
            return Err(Error::config(format!(
                "query_template '{}' lacks the {CLAIM_PLACEHOLDER} placeholder",
                self.query_template
            )));
        }
        Ok(())
    }

    pub fn build_query(&self, claim: &str) -> String {
        self.query_template.replace(CLAIM_PLACEHOLDER, claim)
    }
}

/// Range checks shared by advocate construction and direct index queries.
pub fn validate_query(top_k: usize, min_similarity: f32) -> Result<()> {
    if !TOP_K_RANGE.contains(&top_k) {
        return Err(Error::config(format!("top_k {top_k} outside {TOP_K_RANGE:?}")));
    }
    if !MIN_SIMILARITY_RANGE.contains(&min_similarity) {
        return Err(Error::config(format!(
            "min_similarity {min_similarity} outside {MIN_SIMILARITY_RANGE:?}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningSettings {
    pub temperature: f32,
    pub context_window: usize,
    /// Attempts per prompt when the response carries no verdict marker.
    pub max_attempts: usize,
    /// Tag name of reasoning spans to strip, e.g. `think` for `<think>..</think>`.
    pub thinking_token: Option<String>,
}

impl Default for ReasoningSettings {
    fn default() -> Self {
        Self { temperature: 0.1, context_window: 4096, max_attempts: 3, thinking_token: None }
    }
}

impl ReasoningSettings {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::config(format!("temperature {} outside 0.0..=2.0", self.temperature)));
        }
        if self.context_window == 0 {
            return Err(Error::config("context_window must be positive"));
        }
        if self.max_attempts == 0 {
            return Err(Error::config("max_attempts must be at least 1"));
        }
        if matches!(&self.thinking_token, Some(t) if t.trim().is_empty()) {
            return Err(Error::config("thinking_token must not be blank"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub advocate_timeout_ms: u64,
    /// Taxonomy the mediator's raw label is normalized with.
    pub verdict_taxonomy: String,
    /// Taxonomy advocates' verdict labels are read with.
    pub stance_taxonomy: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            advocate_timeout_ms: 120_000,
            verdict_taxonomy: "advocate-mediator".to_string(),
            stance_taxonomy: "advocate-mediator".to_string(),
        }
    }
}

impl SessionSettings {
    pub fn advocate_timeout(&self) -> Duration {
        Duration::from_millis(self.advocate_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.advocate_timeout_ms == 0 {
            return Err(Error::config("advocate_timeout_ms must be positive"));
        }
        if self.verdict_taxonomy.trim().is_empty() || self.stance_taxonomy.trim().is_empty() {
            return Err(Error::config("taxonomy ids must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

impl EmbeddingSettings {
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(Error::config("embedding dim must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomySettings {
    /// Directories holding additional `*.toml` taxonomy tables.
    pub dirs: Vec<String>,
}

/// Complete settings tree as read from configuration files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactcheckSettings {
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub reasoning: ReasoningSettings,
    pub session: SessionSettings,
    pub embedding: EmbeddingSettings,
    pub taxonomy: TaxonomySettings,
}

impl FactcheckSettings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.reasoning.validate()?;
        self.session.validate()?;
        self.embedding.validate()
    }
}
