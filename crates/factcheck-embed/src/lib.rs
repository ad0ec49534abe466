//! factcheck-embed
//!
//! Local, dependency-free embedding backend plus the vector helpers the index
//! scores with. Model-backed embedders plug in through
//! `factcheck_core::traits::Embedder`.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::Result;
use twox_hash::XxHash64;

use factcheck_core::settings::EmbeddingSettings;
use factcheck_core::traits::Embedder;

mod vector;

pub use vector::{cosine_similarity, l2_normalize};

/// Feature-hashing bag-of-words embedder.
///
/// Tokens are lowercased and trimmed of surrounding punctuation, hashed with
/// xxHash64 into `dim` buckets with a hash-derived sign, then L2-normalized.
/// Output is a pure function of the input text.
pub struct HashingEmbedder {
    dim: usize,
    id: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> factcheck_core::Result<Self> {
        EmbeddingSettings { dim }.validate()?;
        Ok(Self { dim, id: format!("hashing:xxh64:d{dim}") })
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            #[allow(clippy::cast_possible_truncation)]
            let idx = (h % self.dim as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        l2_normalize(&mut v);
        v
    }
}

impl Embedder for HashingEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Lowercased tokens with leading/trailing non-alphanumerics removed.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
}

/// Embedder selected from explicit settings; no environment lookups.
pub fn default_embedder(settings: &EmbeddingSettings) -> factcheck_core::Result<Arc<dyn Embedder>> {
    let embedder = HashingEmbedder::new(settings.dim)?;
    tracing::debug!(dim = settings.dim, "using hashing embedder");
    Ok(Arc::new(embedder))
}
