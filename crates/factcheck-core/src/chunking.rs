//! Word-window chunking with overlap.
//!
//! Each document is split on whitespace into words; windows of `chunk_size`
//! words advance by `chunk_size - chunk_overlap`, so consecutive chunks share
//! exactly `chunk_overlap` words and every word lands in at least one chunk.

use crate::error::Result;
use crate::settings::ChunkingSettings;
use crate::types::{Chunk, SourceDocuments};

#[derive(Debug, Clone)]
pub struct Chunker {
    settings: ChunkingSettings,
}

impl Chunker {
    pub fn new(settings: ChunkingSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &ChunkingSettings {
        &self.settings
    }

    /// Chunks of every document of a source, in document order.
    pub fn chunk_source(&self, source: &SourceDocuments) -> Vec<Chunk> {
        source
            .documents
            .iter()
            .enumerate()
            .flat_map(|(doc_index, text)| self.chunk_document(&source.source_id, doc_index, text))
            .collect()
    }

    pub fn chunk_document(&self, source_id: &str, doc_index: usize, text: &str) -> Vec<Chunk> {
        let spans = word_spans(text);
        if spans.is_empty() {
            return Vec::new();
        }
        let size = self.settings.chunk_size;
        let stride = size - self.settings.chunk_overlap;

        let mut windows = Vec::new();
        let mut first = 0usize;
        loop {
            let last = (first + size).min(spans.len());
            windows.push((spans[first].0, spans[last - 1].1));
            if last >= spans.len() {
                break;
            }
            first += stride;
        }

        let total_chunks = windows.len();
        windows
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (start, end))| Chunk {
                id: format!("{source_id}:{doc_index}:{chunk_index}"),
                source_id: source_id.to_string(),
                doc_index,
                chunk_index,
                total_chunks,
                start,
                end,
                content: text[start..end].to_string(),
            })
            .collect()
    }
}

/// Byte ranges of whitespace-separated words.
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}
