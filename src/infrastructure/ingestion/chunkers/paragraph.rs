//! Paragraph-based chunking strategy

use once_cell::sync::Lazy;
use regex::Regex;

use super::sentence::sentence_units;
use super::spans::{merge, to_chunks, Span};
use crate::domain::ingestion::{Chunk, ChunkingStrategy};
use crate::domain::DomainError;

static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t\r]*\n").unwrap());

/// Blank-line separated paragraphs merged up to `chunk_size` characters.
/// Oversize paragraphs are split by sentence.
#[derive(Debug, Clone)]
pub struct ParagraphChunker {
    chunk_size: usize,
}

impl Default for ParagraphChunker {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl ParagraphChunker {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    fn paragraphs(text: &str) -> Vec<Span> {
        let mut paragraphs = Vec::new();
        let mut cursor = 0;

        for separator in BLANK_LINE.find_iter(text) {
            paragraphs.push(Span::new(cursor, separator.start()));
            cursor = separator.end();
        }
        paragraphs.push(Span::new(cursor, text.len()));

        paragraphs
            .into_iter()
            .filter_map(|p| p.trimmed(text))
            .collect()
    }
}

impl ChunkingStrategy for ParagraphChunker {
    fn chunk(&self, content: &str) -> Result<Vec<Chunk>, DomainError> {
        let units: Vec<Span> = Self::paragraphs(content)
            .into_iter()
            .flat_map(|paragraph| {
                if paragraph.char_len(content) <= self.chunk_size {
                    vec![paragraph]
                } else {
                    sentence_units(content, paragraph, self.chunk_size)
                }
            })
            .collect();

        let merged = merge(content, &units, self.chunk_size);
        Ok(to_chunks(content, &merged, true))
    }

    fn name(&self) -> &'static str {
        "paragraph"
    }
}
