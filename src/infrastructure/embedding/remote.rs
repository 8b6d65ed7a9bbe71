//! Batching, retrying embedder over an `EmbeddingProvider`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::embedding::{Embedder, EmbeddingProvider, EmbeddingRequest, EmbeddingVector};
use crate::domain::DomainError;

/// Backoff bounds for transient provider failures
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> usize {
    3
}

fn default_min_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    fn strategy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms.max(self.min_delay_ms)))
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// `remote` embedder.
///
/// Inputs are sent in sequential batches of `batch_size`. Each batch call is
/// bounded by `timeout` and retried with exponential backoff while the error
/// is transient (429, 5xx, timeouts, connection errors).
#[derive(Debug, Clone)]
pub struct RemoteEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
    dimensions: Option<usize>,
    batch_size: usize,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl RemoteEmbedder {
    /// Embedder using the provider's default model
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let model = provider.default_model().to_string();

        Self {
            provider,
            model,
            dimensions: None,
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Requested output dimensions, sent to the provider
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn call_provider(&self, request: EmbeddingRequest) -> Result<Vec<Vec<f32>>, DomainError> {
        let expected = request.input.len();

        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.provider.embed(request))
                .await
                .map_err(|_| {
                    DomainError::timeout(format!("{} embedding call", self.provider.provider_name()))
                })??,
            None => self.provider.embed(request).await?,
        };

        response.into_ordered_vectors(self.provider.provider_name(), expected)
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let provider = self.provider.provider_name().to_string();

        let mut request = EmbeddingRequest::new(self.model.clone(), batch.to_vec());
        if let Some(dims) = self.dimensions {
            request = request.with_dimensions(dims);
        }

        (|| async { self.call_provider(request.clone()).await })
            .retry(self.retry.strategy())
            .when(|e: &DomainError| e.is_transient())
            .notify(|e: &DomainError, delay: Duration| {
                warn!(
                    provider = %provider,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Transient embedding failure, retrying"
                );
            })
            .await
            .map_err(|e| match e {
                DomainError::EmbeddingProvider { .. } => e,
                other => DomainError::embedding_provider(provider.clone(), other.to_string()),
            })
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for (batch_number, batch) in texts.chunks(self.batch_size).enumerate() {
            debug!(
                provider = %self.provider.provider_name(),
                batch = batch_number,
                size = batch.len(),
                "Embedding batch"
            );

            for vector in self.embed_batch(batch).await? {
                let index = vectors.len();
                vectors.push(EmbeddingVector::new(index, vector, self.model.clone()));
            }
        }

        Ok(vectors)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions.or_else(|| self.provider.dimensions(&self.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::infrastructure::embedding::{HttpClient, OpenAiEmbeddingProvider};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            min_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text {}", i)).collect()
    }

    #[tokio::test]
    async fn test_batches_preserve_order_and_arity() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 4));
        let embedder = RemoteEmbedder::new(provider.clone()).with_batch_size(2);

        let mut input = texts(5);
        input.push("text 0".to_string());

        let vectors = embedder.embed(&input).await.unwrap();

        assert_eq!(vectors.len(), 6);
        assert_eq!(provider.batch_sizes(), vec![2, 2, 2]);
        for (i, v) in vectors.iter().enumerate() {
            assert_eq!(v.index, i);
            assert_eq!(v.vector, provider.vector_for(&input[i]));
        }
        assert_eq!(vectors[0].vector, vectors[5].vector);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let provider = Arc::new(
            MockEmbeddingProvider::new("mock", 4)
                .with_error(DomainError::http(Some(429), "slow down"))
                .with_error(DomainError::http(Some(503), "unavailable")),
        );
        let embedder = RemoteEmbedder::new(provider.clone()).with_retry(fast_retry(3));

        let vectors = embedder.embed(&texts(2)).await.unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_become_provider_error() {
        let provider = Arc::new(
            MockEmbeddingProvider::new("mock", 4)
                .with_error(DomainError::http(Some(500), "boom"))
                .with_error(DomainError::http(Some(500), "boom"))
                .with_error(DomainError::http(Some(500), "boom")),
        );
        let embedder = RemoteEmbedder::new(provider.clone()).with_retry(fast_retry(2));

        let err = embedder.embed(&texts(1)).await.unwrap_err();

        assert!(matches!(err, DomainError::EmbeddingProvider { ref provider, .. } if provider == "mock"));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let provider = Arc::new(
            MockEmbeddingProvider::new("mock", 4).with_error(DomainError::http(Some(401), "bad key")),
        );
        let embedder = RemoteEmbedder::new(provider.clone()).with_retry(fast_retry(3));

        let err = embedder.embed(&texts(1)).await.unwrap_err();

        assert!(matches!(err, DomainError::EmbeddingProvider { .. }));
        assert_eq!(provider.calls(), 1);
    }

    fn embeddings_body(count: usize) -> serde_json::Value {
        let data: Vec<serde_json::Value> = (0..count)
            .rev()
            .map(|i| serde_json::json!({"index": i, "embedding": [i as f32, 1.0]}))
            .collect();

        serde_json::json!({"model": "text-embedding-3-small", "data": data})
    }

    #[tokio::test]
    async fn test_http_retry_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embeddings_body(3)))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddingProvider::with_base_url(HttpClient::new(), "key", server.uri());
        let embedder = RemoteEmbedder::new(Arc::new(provider)).with_retry(fast_retry(2));

        let vectors = embedder.embed(&texts(3)).await.unwrap();

        assert_eq!(
            vectors.iter().map(|v| v.vector[0]).collect::<Vec<_>>(),
            vec![0.0, 1.0, 2.0]
        );
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embeddings_body(1)))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddingProvider::with_base_url(HttpClient::new(), "key", server.uri());
        let embedder = RemoteEmbedder::new(Arc::new(provider)).with_retry(fast_retry(2));

        let err = embedder.embed(&texts(2)).await.unwrap_err();

        assert!(matches!(err, DomainError::EmbeddingProvider { .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[test]
    fn test_dimensions_fall_back_to_provider() {
        let provider = OpenAiEmbeddingProvider::new(HttpClient::new(), "key");
        let embedder = RemoteEmbedder::new(Arc::new(provider));

        assert_eq!(embedder.dimensions(), Some(1536));
        assert_eq!(embedder.clone().with_dimensions(256).dimensions(), Some(256));
    }
}
