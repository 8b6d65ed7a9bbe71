//! Searcher component trait and result types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::domain::index::ScoredRecord;
use crate::domain::ingestion::validate_collection;
use crate::domain::DomainError;

/// A ranked passage returned by retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk id
    pub id: String,
    pub content: String,
    /// Relevance in [0, 1], higher is better
    pub score: f32,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, content: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            score,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_all_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

impl From<ScoredRecord> for SearchResult {
    fn from(record: ScoredRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            score: record.score,
            metadata: record.metadata,
        }
    }
}

/// Descending score, ties by ascending id
pub fn compare_ranked(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort results into canonical ranking order
pub fn sort_ranked(results: &mut [SearchResult]) {
    results.sort_by(compare_ranked);
}

/// Query against one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub collection: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    10
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            collection: collection.into(),
            top_k: default_top_k(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Input contract checks, run before any backend call
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_collection(&self.collection)?;

        if self.query.trim().is_empty() {
            return Err(DomainError::validation("query must not be empty"));
        }

        if self.top_k == 0 {
            return Err(DomainError::validation("top_k must be greater than 0"));
        }

        Ok(())
    }
}

/// Retrieves ranked results for a query
#[async_trait]
pub trait Searcher: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Results in ranking order (see [`compare_ranked`]), at most `top_k`
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, DomainError>;
}
