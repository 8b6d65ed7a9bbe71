//! Embedding provider capability
//!
//! An `EmbeddingProvider` is the external service (OpenAI-compatible API,
//! hosted model) the remote embedder talks to. It takes a batch of texts and
//! returns one vector per text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Batch request to an embedding provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: Vec<String>,
    /// Output dimensions, for models that support shortening
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// A single vector in a provider response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Position of the embedded text in the request
    pub index: usize,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    pub prompt_tokens: u32,
    pub total_tokens: u32,
}

/// Provider response for one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub model: String,
    pub embeddings: Vec<Embedding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<EmbeddingUsage>,
}

impl EmbeddingResponse {
    pub fn new(model: impl Into<String>, embeddings: Vec<Embedding>) -> Self {
        Self {
            model: model.into(),
            embeddings,
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: EmbeddingUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Vectors in request order.
    ///
    /// Providers may return entries out of order; they are sorted by index.
    /// A count that differs from `expected` is an error.
    pub fn into_ordered_vectors(
        mut self,
        provider: &str,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        if self.embeddings.len() != expected {
            return Err(DomainError::embedding_provider(
                provider,
                format!(
                    "expected {} embeddings, received {}",
                    expected,
                    self.embeddings.len()
                ),
            ));
        }

        self.embeddings.sort_by_key(|e| e.index);

        let in_range = self
            .embeddings
            .iter()
            .enumerate()
            .all(|(position, e)| e.index == position);

        if !in_range {
            return Err(DomainError::embedding_provider(
                provider,
                "response indices do not cover the request",
            ));
        }

        Ok(self.embeddings.into_iter().map(|e| e.vector).collect())
    }
}

/// Trait for embedding providers (OpenAI, Cohere, etc.)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate embeddings for the given batch
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    fn provider_name(&self) -> &str;

    fn default_model(&self) -> &str;

    /// Embedding dimensions for a model, when known
    fn dimensions(&self, model: &str) -> Option<usize>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted embedding provider.
    ///
    /// Queued errors are returned first, one per call; afterwards every call
    /// succeeds with deterministic vectors derived from the text bytes.
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        name: String,
        dimensions: usize,
        queued_errors: Mutex<Vec<DomainError>>,
        calls: AtomicUsize,
        batch_sizes: Mutex<Vec<usize>>,
    }

    impl MockEmbeddingProvider {
        pub fn new(name: impl Into<String>, dimensions: usize) -> Self {
            Self {
                name: name.into(),
                dimensions,
                queued_errors: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                batch_sizes: Mutex::new(Vec::new()),
            }
        }

        /// Fail the next call with `error`; queued errors are returned in order
        pub fn with_error(self, error: DomainError) -> Self {
            self.queued_errors.lock().unwrap().push(error);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn batch_sizes(&self) -> Vec<usize> {
            self.batch_sizes.lock().unwrap().clone()
        }

        pub fn vector_for(&self, text: &str) -> Vec<f32> {
            let hash = text.bytes().fold(0u64, |acc, b| {
                acc.wrapping_mul(31).wrapping_add(b as u64)
            });

            (0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u64 * 7919) % 1000) as f32 / 1000.0) - 0.5)
                .collect()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            {
                let mut errors = self.queued_errors.lock().unwrap();
                if !errors.is_empty() {
                    return Err(errors.remove(0));
                }
            }

            self.batch_sizes.lock().unwrap().push(request.input.len());

            let embeddings = request
                .input
                .iter()
                .enumerate()
                .map(|(index, text)| Embedding {
                    index,
                    vector: self.vector_for(text),
                })
                .collect();

            Ok(EmbeddingResponse::new(request.model, embeddings))
        }

        fn provider_name(&self) -> &str {
            &self.name
        }

        fn default_model(&self) -> &str {
            "mock-embedding"
        }

        fn dimensions(&self, _model: &str) -> Option<usize> {
            Some(self.dimensions)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(index: usize, value: f32) -> Embedding {
        Embedding {
            index,
            vector: vec![value],
        }
    }

    #[test]
    fn test_ordered_vectors_sorts_by_index() {
        let response = EmbeddingResponse::new(
            "m",
            vec![embedding(2, 2.0), embedding(0, 0.0), embedding(1, 1.0)],
        );

        let vectors = response.into_ordered_vectors("test", 3).unwrap();
        assert_eq!(vectors, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_ordered_vectors_count_mismatch() {
        let response = EmbeddingResponse::new("m", vec![embedding(0, 0.0)]);
        let err = response.into_ordered_vectors("test", 2).unwrap_err();

        assert!(matches!(err, DomainError::EmbeddingProvider { .. }));
    }

    #[test]
    fn test_ordered_vectors_duplicate_index() {
        let response = EmbeddingResponse::new("m", vec![embedding(0, 0.0), embedding(0, 1.0)]);
        assert!(response.into_ordered_vectors("test", 2).is_err());
    }

    #[tokio::test]
    async fn test_mock_provider_is_deterministic() {
        let provider = mock::MockEmbeddingProvider::new("test", 8);
        let request = EmbeddingRequest::new("m", vec!["Hello".into(), "Hello".into()]);

        let response = provider.embed(request).await.unwrap();

        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[0].vector, response.embeddings[1].vector);
        assert_eq!(response.embeddings[0].vector.len(), 8);
    }

    #[tokio::test]
    async fn test_mock_provider_queued_errors() {
        let provider = mock::MockEmbeddingProvider::new("test", 4)
            .with_error(DomainError::http(Some(429), "slow down"));

        let request = EmbeddingRequest::new("m", vec!["a".into()]);
        assert!(provider.embed(request.clone()).await.is_err());
        assert!(provider.embed(request).await.is_ok());
        assert_eq!(provider.calls(), 2);
    }
}
