//! Byte-span helpers shared by the chunkers
//!
//! Chunkers split and merge `Span`s over the original text, so offsets stay
//! exact; spans only become `Chunk`s (with char offsets) at the very end.

use unicode_segmentation::UnicodeSegmentation;

use crate::domain::ingestion::Chunk;

/// Half-open byte range into the source text, on char boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn whole(text: &str) -> Self {
        Self::new(0, text.len())
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    pub fn char_len(&self, text: &str) -> usize {
        self.slice(text).chars().count()
    }

    /// Shrink to exclude surrounding whitespace; `None` if nothing is left
    pub fn trimmed(&self, text: &str) -> Option<Span> {
        let slice = self.slice(text);
        let leading = slice.len() - slice.trim_start().len();
        let trailing = slice.len() - slice.trim_end().len();

        if leading == slice.len() {
            None
        } else {
            Some(Span::new(self.start + leading, self.end - trailing))
        }
    }
}

/// Byte offset to char offset lookup
pub struct CharIndex {
    boundaries: Vec<usize>,
}

impl CharIndex {
    pub fn new(text: &str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    /// Number of chars in the text
    pub fn len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Char offset of a byte offset on a char boundary
    pub fn char_at(&self, byte: usize) -> usize {
        self.boundaries
            .binary_search(&byte)
            .unwrap_or_else(|insert| insert)
    }

    /// Byte offset of a char offset, clamped to the text end
    pub fn byte_at(&self, char_offset: usize) -> usize {
        self.boundaries[char_offset.min(self.len())]
    }
}

/// Split at every occurrence of `separator`, which stays attached to the
/// preceding piece. Pieces cover the span contiguously.
pub fn split_on(text: &str, span: Span, separator: &str) -> Vec<Span> {
    let mut pieces = Vec::new();
    let mut cursor = span.start;

    for (offset, matched) in span.slice(text).match_indices(separator) {
        let end = span.start + offset + matched.len();
        if end > cursor {
            pieces.push(Span::new(cursor, end));
            cursor = end;
        }
    }

    if cursor < span.end {
        pieces.push(Span::new(cursor, span.end));
    }

    pieces
}

/// Unicode sentence boundaries (UAX #29), contiguous
pub fn split_sentences(text: &str, span: Span) -> Vec<Span> {
    span.slice(text)
        .split_sentence_bound_indices()
        .map(|(offset, sentence)| {
            Span::new(span.start + offset, span.start + offset + sentence.len())
        })
        .collect()
}

/// Unicode word boundaries (UAX #29), contiguous
pub fn split_words(text: &str, span: Span) -> Vec<Span> {
    span.slice(text)
        .split_word_bound_indices()
        .map(|(offset, word)| Span::new(span.start + offset, span.start + offset + word.len()))
        .collect()
}

/// Hard split every `max_chars` characters
pub fn split_chars(text: &str, span: Span, max_chars: usize) -> Vec<Span> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut start = span.start;
    let mut count = 0;

    for (offset, _) in span.slice(text).char_indices() {
        if count == max_chars {
            pieces.push(Span::new(start, span.start + offset));
            start = span.start + offset;
            count = 0;
        }
        count += 1;
    }

    if start < span.end {
        pieces.push(Span::new(start, span.end));
    }

    pieces
}

/// Greedily merge consecutive pieces while the merged span stays within
/// `max_chars`. A single piece longer than `max_chars` is emitted alone.
pub fn merge(text: &str, pieces: &[Span], max_chars: usize) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    let mut current: Option<Span> = None;

    for piece in pieces {
        current = match current {
            None => Some(*piece),
            Some(open) => {
                let candidate = Span::new(open.start, piece.end);
                if candidate.trimmed(text).map_or(0, |s| s.char_len(text)) <= max_chars {
                    Some(candidate)
                } else {
                    merged.push(open);
                    Some(*piece)
                }
            }
        };
    }

    merged.extend(current);
    merged
}

/// Turn spans into chunks with dense indices and char offsets.
///
/// With `strip` set, each span is trimmed first; spans that are empty after
/// the whitespace policy are dropped.
pub fn to_chunks(text: &str, spans: &[Span], strip: bool) -> Vec<Chunk> {
    let index = CharIndex::new(text);

    spans
        .iter()
        .filter_map(|span| if strip { span.trimmed(text) } else { Some(*span) })
        .filter(|span| span.start < span.end)
        .enumerate()
        .map(|(i, span)| {
            Chunk::new(
                span.slice(text),
                i,
                index.char_at(span.start),
                index.char_at(span.end),
            )
        })
        .collect()
}
