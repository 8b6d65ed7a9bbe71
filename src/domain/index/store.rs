//! Index backend capabilities
//!
//! A vector-capable store and a lexical text index, each exposed as
//! upsert / delete / query / get over named collections. Upserts replace a
//! record whole; readers never observe a half-written record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Stored entry of a vector collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub content: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Stored entry of a text collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Query hit returned by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub id: String,
    pub content: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Nearest-neighbour backend
#[async_trait]
pub trait VectorStore: Send + Sync + Debug {
    /// Declared dimensionality of a collection, `None` if it does not exist
    async fn collection_dimensions(&self, collection: &str) -> Result<Option<usize>, DomainError>;

    /// Create the collection if missing; returns its declared dimensionality
    async fn ensure_collection(&self, collection: &str, dimensions: usize) -> Result<usize, DomainError>;

    /// Insert or replace records by id; returns the number written
    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<usize, DomainError>;

    /// Remove records; missing ids are ignored. Returns the number removed
    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize, DomainError>;

    /// Top `top_k` records by cosine similarity (raw, in [-1, 1])
    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<VectorRecord>, DomainError>;

    async fn count(&self, collection: &str) -> Result<usize, DomainError>;
}

/// Lexical full-text backend
#[async_trait]
pub trait TextIndex: Send + Sync + Debug {
    async fn upsert(&self, collection: &str, records: Vec<TextRecord>) -> Result<usize, DomainError>;

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize, DomainError>;

    /// Top `top_k` records by raw relevance score, higher is better
    async fn query(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<TextRecord>, DomainError>;

    async fn count(&self, collection: &str) -> Result<usize, DomainError>;
}
