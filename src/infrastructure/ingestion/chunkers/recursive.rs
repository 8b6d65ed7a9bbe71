//! Recursive chunking strategy

use super::spans::{merge, split_chars, split_on, split_sentences, to_chunks, Span};
use crate::domain::ingestion::{Chunk, ChunkingStrategy};
use crate::domain::DomainError;

/// Separator levels, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Paragraph,
    Line,
    Sentence,
    Word,
    Character,
}

impl Level {
    fn finer(self) -> Level {
        match self {
            Level::Paragraph => Level::Line,
            Level::Line => Level::Sentence,
            Level::Sentence => Level::Word,
            Level::Word | Level::Character => Level::Character,
        }
    }
}

/// Splits on the coarsest separator that keeps pieces under `chunk_size`.
///
/// Order: blank lines, newlines, sentence boundaries, spaces, then a hard
/// character split. Small neighbouring pieces are merged back up to
/// `chunk_size`.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl RecursiveChunker {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    fn split(&self, text: &str, span: Span, level: Level) -> Vec<Span> {
        if span.trimmed(text).map_or(0, |s| s.char_len(text)) <= self.chunk_size {
            return vec![span];
        }

        let pieces = match level {
            Level::Paragraph => split_on(text, span, "\n\n"),
            Level::Line => split_on(text, span, "\n"),
            Level::Sentence => split_sentences(text, span),
            Level::Word => split_on(text, span, " "),
            Level::Character => return split_chars(text, span, self.chunk_size),
        };

        if pieces.len() <= 1 {
            return self.split(text, span, level.finer());
        }

        let fine: Vec<Span> = pieces
            .into_iter()
            .flat_map(|piece| self.split(text, piece, level.finer()))
            .collect();

        merge(text, &fine, self.chunk_size)
    }
}

impl ChunkingStrategy for RecursiveChunker {
    fn chunk(&self, content: &str) -> Result<Vec<Chunk>, DomainError> {
        if content.trim().is_empty() {
            return Ok(vec![]);
        }

        let spans = self.split(content, Span::whole(content), Level::Paragraph);
        Ok(to_chunks(content, &spans, true))
    }

    fn name(&self) -> &'static str {
        "recursive"
    }
}
