//! Sentence-based chunking strategy

use super::spans::{merge, split_chars, split_sentences, split_words, to_chunks, Span};
use crate::domain::ingestion::{Chunk, ChunkingStrategy};
use crate::domain::DomainError;

/// Trimmed sentences of `span`, each at most `max_chars`.
///
/// A longer sentence is broken into merged word runs, and a single word
/// longer than the limit is split by characters.
pub(super) fn sentence_units(text: &str, span: Span, max_chars: usize) -> Vec<Span> {
    split_sentences(text, span)
        .into_iter()
        .filter_map(|sentence| sentence.trimmed(text))
        .flat_map(|sentence| {
            if sentence.char_len(text) <= max_chars {
                return vec![sentence];
            }

            let words: Vec<Span> = split_words(text, sentence)
                .into_iter()
                .flat_map(|word| {
                    if word.char_len(text) > max_chars {
                        split_chars(text, word, max_chars)
                    } else {
                        vec![word]
                    }
                })
                .collect();

            merge(text, &words, max_chars)
        })
        .collect()
}

/// Unicode sentences merged up to `chunk_size` characters, optionally
/// repeating the last `sentence_overlap` sentences at the start of the next
/// chunk.
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    sentence_overlap: usize,
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl SentenceChunker {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            sentence_overlap: 0,
        }
    }

    pub fn with_sentence_overlap(mut self, sentences: usize) -> Self {
        self.sentence_overlap = sentences;
        self
    }

    fn group(&self, text: &str, units: &[Span]) -> Vec<Span> {
        let mut groups = Vec::new();
        let mut first = 0;

        while first < units.len() {
            let mut last = first;

            while last + 1 < units.len()
                && Span::new(units[first].start, units[last + 1].end).char_len(text)
                    <= self.chunk_size
            {
                last += 1;
            }

            groups.push(Span::new(units[first].start, units[last].end));

            if last + 1 >= units.len() {
                break;
            }

            first = (last + 1).saturating_sub(self.sentence_overlap).max(first + 1);
        }

        groups
    }
}

impl ChunkingStrategy for SentenceChunker {
    fn chunk(&self, content: &str) -> Result<Vec<Chunk>, DomainError> {
        let units = sentence_units(content, Span::whole(content), self.chunk_size);
        let groups = self.group(content, &units);

        Ok(to_chunks(content, &groups, true))
    }

    fn name(&self) -> &'static str {
        "sentence"
    }
}
