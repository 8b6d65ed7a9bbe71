//! Fixed-size chunking strategy

use tracing::warn;

use super::spans::{to_chunks, CharIndex, Span};
use crate::domain::ingestion::{Chunk, ChunkingStrategy};
use crate::domain::DomainError;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Sliding character windows of `chunk_size`, advancing by
/// `chunk_size - chunk_overlap`. The last window ends at the text end.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    strip_whitespace: bool,
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl FixedSizeChunker {
    /// An overlap that is not smaller than the chunk size is clamped to a
    /// quarter of it.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);

        let chunk_overlap = if chunk_overlap >= chunk_size {
            let clamped = chunk_size / 4;
            warn!(
                chunk_size,
                chunk_overlap,
                clamped,
                "chunk_overlap must be smaller than chunk_size, clamping"
            );
            clamped
        } else {
            chunk_overlap
        };

        Self {
            chunk_size,
            chunk_overlap,
            strip_whitespace: true,
        }
    }

    pub fn with_strip_whitespace(mut self, strip: bool) -> Self {
        self.strip_whitespace = strip;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    fn windows(&self, text: &str) -> Vec<Span> {
        let index = CharIndex::new(text);
        let total = index.len();
        let step = self.chunk_size - self.chunk_overlap;

        let mut windows = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(total);
            windows.push(Span::new(index.byte_at(start), index.byte_at(end)));

            if end >= total {
                break;
            }

            start += step;
        }

        windows
    }
}

impl ChunkingStrategy for FixedSizeChunker {
    fn chunk(&self, content: &str) -> Result<Vec<Chunk>, DomainError> {
        if content.is_empty() {
            return Ok(vec![]);
        }

        let windows = self.windows(content);
        Ok(to_chunks(content, &windows, self.strip_whitespace))
    }

    fn name(&self) -> &'static str {
        "fixed_size"
    }
}
