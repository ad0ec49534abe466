use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use factcheck_core::chunking::Chunker;
use factcheck_core::error::{Error, Result};
use factcheck_core::settings::{validate_query, ChunkingSettings};
use factcheck_core::traits::Embedder;
use factcheck_core::types::{Chunk, RetrievedEvidence, ScoredChunk, SourceDocuments};
use factcheck_embed::cosine_similarity;

use crate::cache::{content_hash, CacheEntry, EmbeddingCache};

/// Chunks of one source plus their embeddings, bound to the embedder that
/// produced them. Rebuilding yields a new index; nothing mutates in place.
pub struct EvidenceIndex {
    source_id: String,
    settings: ChunkingSettings,
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    embedder: Arc<dyn Embedder>,
}

impl EvidenceIndex {
    pub fn build(
        source: &SourceDocuments,
        settings: &ChunkingSettings,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        Self::build_cached(source, settings, embedder, &mut EmbeddingCache::new())
    }

    /// Build, reusing and filling `cache` for chunk embeddings.
    pub fn build_cached(
        source: &SourceDocuments,
        settings: &ChunkingSettings,
        embedder: Arc<dyn Embedder>,
        cache: &mut EmbeddingCache,
    ) -> Result<Self> {
        let chunker = Chunker::new(settings.clone())?;
        let chunks = chunker.chunk_source(source);
        let embedder_id = embedder.embedder_id().to_string();
        let dim = embedder.dim();

        let hashes: Vec<String> = chunks.iter().map(|c| content_hash(&c.content)).collect();
        let mut known = cache.get_many(&embedder_id, &hashes);

        // Distinct texts not yet cached, in first-seen order.
        let mut seen = HashSet::new();
        let mut pending: Vec<(String, String)> = Vec::new();
        for (chunk, hash) in chunks.iter().zip(&hashes) {
            if !known.contains_key(hash) && seen.insert(hash.as_str()) {
                pending.push((hash.clone(), chunk.content.clone()));
            }
        }
        let cached_hits = known.len();

        for batch in pending.chunks(settings.embed_batch_size) {
            let texts: Vec<String> = batch.iter().map(|(_, t)| t.clone()).collect();
            let vectors = embedder
                .embed_batch(&texts)
                .map_err(|e| Error::Embedding(format!("{e:#}")))?;
            if vectors.len() != texts.len() {
                return Err(Error::Embedding(format!(
                    "embedder '{embedder_id}' returned {} vectors for {} texts",
                    vectors.len(),
                    texts.len()
                )));
            }
            let mut entries = Vec::with_capacity(batch.len());
            for ((hash, _), vector) in batch.iter().zip(vectors) {
                check_dim(&embedder_id, dim, &vector)?;
                known.insert(hash.clone(), vector.clone());
                entries.push(CacheEntry { content_hash: hash.clone(), embedder_id: embedder_id.clone(), vector });
            }
            cache.put_many(entries);
        }

        let embeddings = hashes
            .iter()
            .map(|h| {
                known
                    .get(h)
                    .cloned()
                    .ok_or_else(|| Error::Embedding(format!("missing embedding for chunk hash {h}")))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            source_id = %source.source_id,
            documents = source.documents.len(),
            chunks = chunks.len(),
            cached_hits,
            embedder = %embedder_id,
            "built evidence index"
        );

        Ok(Self {
            source_id: source.source_id.clone(),
            settings: settings.clone(),
            chunks,
            embeddings,
            embedder,
        })
    }

    /// A fresh index over new documents with the same settings and embedder.
    pub fn rebuild(&self, source: &SourceDocuments) -> Result<Self> {
        Self::build(source, &self.settings, Arc::clone(&self.embedder))
    }

    /// Chunks scoring at least `min_similarity` against the claim, best first,
    /// ties in chunk order, at most `top_k` entries. An empty result is not an error.
    pub fn query(&self, claim_text: &str, top_k: usize, min_similarity: f32) -> Result<RetrievedEvidence> {
        validate_query(top_k, min_similarity)?;
        let embedder_id = self.embedder.embedder_id();
        let query_vec = self
            .embedder
            .embed_batch(&[claim_text.to_string()])
            .map_err(|e| Error::Embedding(format!("{e:#}")))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding(format!("embedder '{embedder_id}' returned no vector")))?;
        check_dim(embedder_id, self.embedder.dim(), &query_vec)?;

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, emb)| (i, cosine_similarity(&query_vec, emb)))
            .filter(|&(_, score)| score.is_finite() && score >= min_similarity)
            .collect();
        // Stable sort keeps chunk order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        let entries = scored
            .into_iter()
            .map(|(i, score)| ScoredChunk { chunk: self.chunks[i].clone(), score })
            .collect();
        Ok(RetrievedEvidence::new(entries))
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn embedder_id(&self) -> &str {
        self.embedder.embedder_id()
    }

    pub fn settings(&self) -> &ChunkingSettings {
        &self.settings
    }
}

impl fmt::Debug for EvidenceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvidenceIndex")
            .field("source_id", &self.source_id)
            .field("chunks", &self.chunks.len())
            .field("embedder", &self.embedder.embedder_id())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn check_dim(embedder_id: &str, dim: usize, vector: &[f32]) -> Result<()> {
    if vector.len() == dim {
        Ok(())
    } else {
        Err(Error::Embedding(format!(
            "embedder '{embedder_id}' produced a {}-dimensional vector, expected {dim}",
            vector.len()
        )))
    }
}
