//! Chunking strategy trait and types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::domain::DomainError;

/// A chunk of text extracted from a parsed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    /// Dense 0-based position among the emitted chunks
    pub index: usize,
    /// Character offset (not byte) where the chunk starts in the parsed text
    pub start: usize,
    /// Character offset one past the chunk's last character
    pub end: usize,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Chunk {
    pub fn new(content: impl Into<String>, index: usize, start: usize, end: usize) -> Self {
        Self {
            content: content.into(),
            index,
            start,
            end,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Offsets and index as a JSON map, merged into indexed metadata
    pub fn position_map(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("chunk_index".to_string(), self.index.into());
        map.insert("char_start".to_string(), self.start.into());
        map.insert("char_end".to_string(), self.end.into());
        map
    }
}

/// Trait for chunking strategies.
///
/// Options are bound when the strategy is constructed. Implementations
/// return an empty vec for empty input, never emit whitespace-only chunks and
/// number emitted chunks densely from 0.
pub trait ChunkingStrategy: Send + Sync + Debug {
    /// Split content into chunks
    fn chunk(&self, content: &str) -> Result<Vec<Chunk>, DomainError>;

    /// Get the strategy name
    fn name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Mock chunking strategy for testing
    #[derive(Debug)]
    pub struct MockChunkingStrategy {
        name: &'static str,
        result: Mutex<Option<Result<Vec<Chunk>, String>>>,
    }

    impl MockChunkingStrategy {
        pub fn new() -> Self {
            Self {
                name: "mock",
                result: Mutex::new(None),
            }
        }

        pub fn with_name(mut self, name: &'static str) -> Self {
            self.name = name;
            self
        }

        pub fn with_result(self, chunks: Vec<Chunk>) -> Self {
            *self.result.lock().unwrap() = Some(Ok(chunks));
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.result.lock().unwrap() = Some(Err(error.into()));
            self
        }
    }

    impl Default for MockChunkingStrategy {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ChunkingStrategy for MockChunkingStrategy {
        fn chunk(&self, content: &str) -> Result<Vec<Chunk>, DomainError> {
            if let Some(result) = self.result.lock().unwrap().take() {
                return result.map_err(DomainError::validation);
            }

            if content.trim().is_empty() {
                return Ok(vec![]);
            }

            Ok(vec![Chunk::new(content, 0, 0, content.chars().count())])
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }
}
