//! Indexer component trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::domain::embedding::EmbeddingVector;
use crate::domain::ingestion::Chunk;
use crate::domain::DomainError;

/// One chunk to index, with its stable id and optional vector
#[derive(Debug, Clone)]
pub struct IndexItem {
    pub id: String,
    pub chunk: Chunk,
    pub embedding: Option<EmbeddingVector>,
    /// Document-level metadata merged with the chunk's own
    pub metadata: HashMap<String, serde_json::Value>,
}

impl IndexItem {
    pub fn new(id: impl Into<String>, chunk: Chunk) -> Self {
        Self {
            id: id.into(),
            chunk,
            embedding: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_embedding(mut self, embedding: EmbeddingVector) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Metadata as stored: item metadata, then chunk metadata, then position
    pub fn stored_metadata(&self) -> HashMap<String, serde_json::Value> {
        let mut metadata = self.metadata.clone();

        for (key, value) in &self.chunk.metadata {
            metadata.insert(key.clone(), value.clone());
        }

        metadata.extend(self.chunk.position_map());
        metadata
    }
}

/// Record as written to a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Unique per collection
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Writes chunks into an index backend with upsert semantics
#[async_trait]
pub trait Indexer: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Upsert the items by id, in order
    async fn index(
        &self,
        collection: &str,
        items: Vec<IndexItem>,
    ) -> Result<Vec<IndexedDocument>, DomainError>;

    /// Remove ids; unknown ids are a no-op. Returns the number removed
    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize, DomainError>;
}
