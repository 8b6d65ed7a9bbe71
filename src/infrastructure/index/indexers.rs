//! Built-in indexers over the store and text index backends

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::index::{
    IndexItem, IndexedDocument, Indexer, TextIndex, TextRecord, VectorRecord, VectorStore,
};
use crate::domain::DomainError;

/// `vector_store` indexer: every item must carry a vector.
///
/// The collection is created on first use with `dimensions` when configured,
/// otherwise with the first vector's length. The whole batch is checked
/// before anything is written.
#[derive(Debug, Clone)]
pub struct VectorStoreIndexer {
    store: Arc<dyn VectorStore>,
    dimensions: Option<usize>,
}

impl VectorStoreIndexer {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    async fn expected_dimensions(
        &self,
        collection: &str,
        first: usize,
    ) -> Result<usize, DomainError> {
        match self.store.collection_dimensions(collection).await? {
            Some(existing) => Ok(existing),
            None => Ok(self.dimensions.unwrap_or(first)),
        }
    }
}

#[async_trait]
impl Indexer for VectorStoreIndexer {
    fn name(&self) -> &'static str {
        "vector_store"
    }

    async fn index(
        &self,
        collection: &str,
        items: Vec<IndexItem>,
    ) -> Result<Vec<IndexedDocument>, DomainError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(items.len());

        for item in &items {
            let embedding = item.embedding.as_ref().ok_or_else(|| {
                DomainError::validation(format!(
                    "vector_store indexer requires an embedding for '{}'",
                    item.id
                ))
            })?;

            records.push(VectorRecord {
                id: item.id.clone(),
                content: item.chunk.content.clone(),
                vector: embedding.vector.clone(),
                metadata: item.stored_metadata(),
            });
        }

        let expected = self
            .expected_dimensions(collection, records[0].vector.len())
            .await?;

        if let Some(bad) = records.iter().find(|r| r.vector.len() != expected) {
            return Err(DomainError::dimension_mismatch(collection, expected, bad.vector.len()));
        }

        self.store.ensure_collection(collection, expected).await?;

        let indexed: Vec<IndexedDocument> = records
            .iter()
            .map(|r| IndexedDocument {
                id: r.id.clone(),
                content: r.content.clone(),
                vector: Some(r.vector.clone()),
                metadata: r.metadata.clone(),
            })
            .collect();

        let written = self.store.upsert(collection, records).await?;

        info!(collection = %collection, written, dimensions = expected, "Indexed vectors");

        Ok(indexed)
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize, DomainError> {
        let removed = self.store.delete(collection, ids).await?;
        debug!(collection = %collection, removed, "Deleted vectors");
        Ok(removed)
    }
}

/// `search_index` indexer: lexical only, vectors are ignored
#[derive(Debug, Clone)]
pub struct SearchIndexIndexer {
    index: Arc<dyn TextIndex>,
}

impl SearchIndexIndexer {
    pub fn new(index: Arc<dyn TextIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Indexer for SearchIndexIndexer {
    fn name(&self) -> &'static str {
        "search_index"
    }

    async fn index(
        &self,
        collection: &str,
        items: Vec<IndexItem>,
    ) -> Result<Vec<IndexedDocument>, DomainError> {
        let records: Vec<TextRecord> = items
            .iter()
            .map(|item| TextRecord {
                id: item.id.clone(),
                content: item.chunk.content.clone(),
                metadata: item.stored_metadata(),
            })
            .collect();

        let indexed = records
            .iter()
            .map(|r| IndexedDocument {
                id: r.id.clone(),
                content: r.content.clone(),
                vector: None,
                metadata: r.metadata.clone(),
            })
            .collect();

        let written = self.index.upsert(collection, records).await?;

        info!(collection = %collection, written, "Indexed text");

        Ok(indexed)
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize, DomainError> {
        self.index.delete(collection, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::EmbeddingVector;
    use crate::domain::ingestion::Chunk;
    use crate::infrastructure::index::{InMemoryTextIndex, InMemoryVectorStore};

    fn item(id: &str, content: &str, vector: Option<Vec<f32>>) -> IndexItem {
        let item = IndexItem::new(id, Chunk::new(content, 0, 0, content.chars().count()));
        match vector {
            Some(v) => item.with_embedding(EmbeddingVector::new(0, v, "test")),
            None => item,
        }
    }

    #[tokio::test]
    async fn test_vector_indexer_creates_collection_from_first_vector() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = VectorStoreIndexer::new(store.clone());

        let indexed = indexer
            .index("docs", vec![item("a", "alpha", Some(vec![1.0, 0.0, 0.0]))])
            .await
            .unwrap();

        assert_eq!(indexed.len(), 1);
        assert_eq!(store.collection_dimensions("docs").await.unwrap(), Some(3));
        assert_eq!(
            indexed[0].metadata.get("chunk_index"),
            Some(&serde_json::json!(0))
        );
    }

    #[tokio::test]
    async fn test_vector_indexer_rejects_mismatch_before_write() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = VectorStoreIndexer::new(store.clone()).with_dimensions(2);

        let err = indexer
            .index(
                "docs",
                vec![
                    item("a", "alpha", Some(vec![1.0, 0.0])),
                    item("b", "beta", Some(vec![1.0, 0.0, 0.0])),
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::DimensionMismatch { expected: 2, actual: 3, .. }
        ));
        assert_eq!(store.count("docs").await.unwrap(), 0);
        assert_eq!(store.collection_dimensions("docs").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_vector_indexer_requires_embeddings() {
        let indexer = VectorStoreIndexer::new(Arc::new(InMemoryVectorStore::new()));

        let err = indexer
            .index("docs", vec![item("a", "alpha", None)])
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_reindex_replaces_records() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = VectorStoreIndexer::new(store.clone());

        indexer
            .index("docs", vec![item("doc_chunk_0", "first", Some(vec![1.0, 0.0]))])
            .await
            .unwrap();
        indexer
            .index("docs", vec![item("doc_chunk_0", "second", Some(vec![0.0, 1.0]))])
            .await
            .unwrap();

        assert_eq!(store.count("docs").await.unwrap(), 1);
        let stored = store.get("docs", "doc_chunk_0").await.unwrap().unwrap();
        assert_eq!(stored.content, "second");
    }

    #[tokio::test]
    async fn test_search_index_ignores_vectors() {
        let text = Arc::new(InMemoryTextIndex::new());
        let indexer = SearchIndexIndexer::new(text.clone());

        let indexed = indexer
            .index(
                "docs",
                vec![
                    item("a", "alpha", Some(vec![1.0])),
                    item("b", "beta", None),
                ],
            )
            .await
            .unwrap();

        assert!(indexed.iter().all(|d| d.vector.is_none()));
        assert_eq!(text.count("docs").await.unwrap(), 2);
        assert_eq!(indexer.delete("docs", &["a".to_string()]).await.unwrap(), 1);
    }
}
