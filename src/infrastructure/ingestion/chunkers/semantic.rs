//! Similarity-driven chunking strategy

use super::sentence::sentence_units;
use super::spans::{to_chunks, Span};
use crate::domain::embedding::cosine_similarity;
use crate::domain::ingestion::{Chunk, ChunkingStrategy};
use crate::domain::DomainError;
use crate::infrastructure::embedding::HashingModel;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Groups consecutive sentences while they stay similar.
///
/// Sentences are embedded in-process with a [`HashingModel`]. A new chunk
/// starts where the cosine similarity between adjacent sentences drops below
/// `similarity_threshold`, or where adding the next sentence would exceed
/// `chunk_size` characters.
#[derive(Debug, Clone)]
pub struct SemanticChunker {
    chunk_size: usize,
    similarity_threshold: f32,
    model: HashingModel,
}

impl SemanticChunker {
    pub fn new(model: HashingModel, chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD as f32,
            model,
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold as f32;
        self
    }

    fn group(&self, text: &str, units: &[Span]) -> Vec<Span> {
        let vectors: Vec<Vec<f32>> = units
            .iter()
            .map(|unit| self.model.encode(unit.slice(text)))
            .collect();

        let mut groups = Vec::new();
        let mut open: Option<Span> = None;

        for (i, unit) in units.iter().enumerate() {
            open = match open {
                None => Some(*unit),
                Some(current) => {
                    let similarity = cosine_similarity(&vectors[i - 1], &vectors[i]);
                    let candidate = Span::new(current.start, unit.end);

                    if similarity < self.similarity_threshold
                        || candidate.char_len(text) > self.chunk_size
                    {
                        groups.push(current);
                        Some(*unit)
                    } else {
                        Some(candidate)
                    }
                }
            };
        }

        groups.extend(open);
        groups
    }
}

impl ChunkingStrategy for SemanticChunker {
    fn chunk(&self, content: &str) -> Result<Vec<Chunk>, DomainError> {
        let units = sentence_units(content, Span::whole(content), self.chunk_size);
        let groups = self.group(content, &units);

        Ok(to_chunks(content, &groups, true))
    }

    fn name(&self) -> &'static str {
        "semantic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize) -> SemanticChunker {
        SemanticChunker::new(HashingModel::new("hash-embedding-base", 384), chunk_size)
    }

    #[test]
    fn test_empty_content() {
        assert!(chunker(100).chunk("").unwrap().is_empty());
    }

    #[test]
    fn test_splits_on_topic_change() {
        let text = "Rust ownership rules. Rust ownership moves. Bananas grow in bunches.";
        let chunks = chunker(1000).chunk(text).unwrap();

        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["Rust ownership rules. Rust ownership moves.", "Bananas grow in bunches."]
        );
    }

    #[test]
    fn test_size_cap_forces_boundary() {
        let text = "Rust ownership rules. Rust ownership moves.";
        let chunks = chunker(25).chunk(text).unwrap();

        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_negative_threshold_never_splits_on_similarity() {
        let text = "Rust ownership rules. Rust ownership moves.";
        let chunks = chunker(1000)
            .with_similarity_threshold(-1.0)
            .chunk(text)
            .unwrap();

        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_name() {
        assert_eq!(chunker(10).name(), "semantic");
    }
}
