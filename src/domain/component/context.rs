//! Shared collaborators handed to component constructors

use std::sync::Arc;

use super::registry::ComponentRegistry;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::index::{TextIndex, VectorStore};
use crate::domain::DomainError;

/// Everything a constructor may need beyond its own options.
///
/// Components that create other components (the `auto` parser, the
/// `semantic` searcher) go back through `registry`.
#[derive(Debug, Clone)]
pub struct ComponentContext {
    registry: Arc<ComponentRegistry>,
    vector_store: Option<Arc<dyn VectorStore>>,
    text_index: Option<Arc<dyn TextIndex>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl ComponentContext {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self {
            registry,
            vector_store: None,
            text_index: None,
            embedding_provider: None,
        }
    }

    /// Context over an empty registry
    pub fn empty() -> Self {
        Self::new(Arc::new(ComponentRegistry::new()))
    }

    pub fn with_vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    pub fn with_text_index(mut self, index: Arc<dyn TextIndex>) -> Self {
        self.text_index = Some(index);
        self
    }

    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn vector_store(&self) -> Result<Arc<dyn VectorStore>, DomainError> {
        self.vector_store
            .clone()
            .ok_or_else(|| DomainError::configuration("No vector store configured"))
    }

    pub fn text_index(&self) -> Result<Arc<dyn TextIndex>, DomainError> {
        self.text_index
            .clone()
            .ok_or_else(|| DomainError::configuration("No text index configured"))
    }

    /// Provider injected by the host, if any
    pub fn embedding_provider(&self) -> Option<Arc<dyn EmbeddingProvider>> {
        self.embedding_provider.clone()
    }
}
