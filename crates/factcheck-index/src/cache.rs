//! Embedding cache keyed by `(content_hash, embedder_id)`.
//!
//! Consulted before calling the embedder during index builds and written
//! through on misses, so repeated or shared passages are embedded once.

use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub content_hash: String,
    pub embedder_id: String,
    pub vector: Vec<f32>,
}

#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: HashMap<(String, String), Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached vectors for the given hashes; misses are simply absent.
    pub fn get_many(&self, embedder_id: &str, hashes: &[String]) -> HashMap<String, Vec<f32>> {
        hashes
            .iter()
            .filter_map(|h| {
                self.entries
                    .get(&(h.clone(), embedder_id.to_string()))
                    .map(|v| (h.clone(), v.clone()))
            })
            .collect()
    }

    pub fn put_many(&mut self, entries: Vec<CacheEntry>) {
        for e in entries {
            self.entries.insert((e.content_hash, e.embedder_id), e.vector);
        }
    }
}

pub fn content_hash(s: &str) -> String {
    blake3::hash(s.as_bytes()).to_hex().to_string()
}
