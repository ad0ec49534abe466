//! factcheck-index
//!
//! In-memory evidence index over one source: chunked at build time, embedded
//! once, read-only afterwards. Queries are pure reads and may run
//! concurrently from any number of tasks.

pub mod cache;
pub mod index;

pub use cache::{content_hash, CacheEntry, EmbeddingCache};
pub use index::EvidenceIndex;
