//! In-memory vector store for development and testing

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::embedding::cosine_similarity;
use crate::domain::index::{ScoredRecord, VectorRecord, VectorStore};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct VectorCollection {
    dimensions: usize,
    records: HashMap<String, VectorRecord>,
}

/// Brute-force cosine search over named collections.
///
/// Collections are created on first use with a fixed dimensionality; every
/// write and query is checked against it.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVectorStore {
    collections: Arc<RwLock<HashMap<String, VectorCollection>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn collection_dimensions(&self, collection: &str) -> Result<Option<usize>, DomainError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|c| c.dimensions))
    }

    async fn ensure_collection(&self, collection: &str, dimensions: usize) -> Result<usize, DomainError> {
        if dimensions == 0 {
            return Err(DomainError::validation(format!(
                "collection '{}' needs positive dimensions",
                collection
            )));
        }

        let mut collections = self.collections.write().await;

        let entry = collections.entry(collection.to_string()).or_insert_with(|| {
            debug!(collection = %collection, dimensions, "Creating vector collection");
            VectorCollection {
                dimensions,
                records: HashMap::new(),
            }
        });

        Ok(entry.dimensions)
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<usize, DomainError> {
        let Some(first) = records.first() else {
            return Ok(0);
        };

        let mut collections = self.collections.write().await;

        let expected = collections
            .get(collection)
            .map(|c| c.dimensions)
            .unwrap_or(first.vector.len());

        if let Some(bad) = records.iter().find(|r| r.vector.len() != expected) {
            return Err(DomainError::dimension_mismatch(collection, expected, bad.vector.len()));
        }

        let target = collections
            .entry(collection.to_string())
            .or_insert_with(|| VectorCollection {
                dimensions: expected,
                records: HashMap::new(),
            });

        let written = records.len();
        for record in records {
            target.records.insert(record.id.clone(), record);
        }

        Ok(written)
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize, DomainError> {
        let mut collections = self.collections.write().await;

        let Some(target) = collections.get_mut(collection) else {
            return Ok(0);
        };

        Ok(ids
            .iter()
            .filter(|id| target.records.remove(id.as_str()).is_some())
            .count())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError> {
        let collections = self.collections.read().await;

        let Some(target) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        if vector.len() != target.dimensions {
            return Err(DomainError::dimension_mismatch(
                collection,
                target.dimensions,
                vector.len(),
            ));
        }

        let mut scored: Vec<ScoredRecord> = target
            .records
            .values()
            .map(|record| ScoredRecord {
                id: record.id.clone(),
                content: record.content.clone(),
                score: cosine_similarity(vector, &record.vector),
                metadata: record.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<VectorRecord>, DomainError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.records.get(id).cloned()))
    }

    async fn count(&self, collection: &str) -> Result<usize, DomainError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|c| c.records.len())
            .unwrap_or(0))
    }
}
