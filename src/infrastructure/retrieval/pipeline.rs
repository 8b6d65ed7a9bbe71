//! Retrieval pipeline: search, then the optimizer chain

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::chain::OptimizerChain;
use crate::domain::component::ComponentContext;
use crate::domain::retrieval::{RetrievalRequest, RetrievalResponse};
use crate::domain::DomainError;
use crate::infrastructure::guard::guarded;

/// Stateless retrieval over the components of one context.
///
/// The searcher and the optimizer chain are created per call, so
/// configuration errors surface before any backend is queried.
#[derive(Debug, Clone)]
pub struct RetrievalPipeline {
    ctx: ComponentContext,
    call_timeout: Option<Duration>,
}

impl RetrievalPipeline {
    pub fn new(ctx: ComponentContext) -> Self {
        Self {
            ctx,
            call_timeout: None,
        }
    }

    /// Bound each searcher call
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub async fn retrieve(
        &self,
        request: &RetrievalRequest,
        cancel: &CancellationToken,
    ) -> Result<RetrievalResponse, DomainError> {
        request.validate()?;

        let registry = self.ctx.registry();
        let searcher = registry
            .searchers()?
            .create(&request.searcher.key, &request.searcher.config, &self.ctx)?;
        let optimizers = registry.optimizers()?;
        let chain = OptimizerChain::build(&request.optimizers, optimizers.as_ref(), &self.ctx)?;

        let search_request = request.search_request();
        let candidates = guarded("search", self.call_timeout, cancel, searcher.search(&search_request))
            .await
            .inspect_err(|e| {
                error!(
                    searcher = %request.searcher.key,
                    collection = %request.collection,
                    error = %e,
                    "Search failed"
                );
            })?;

        let candidate_count = candidates.len();
        let results = chain.apply(candidates, &request.query, cancel).await?;

        info!(
            searcher = %request.searcher.key,
            collection = %request.collection,
            candidates = candidate_count,
            returned = results.len(),
            "Retrieval complete"
        );

        Ok(RetrievalResponse {
            results,
            searcher: searcher.name().to_string(),
            optimizers: chain.names(),
            candidates: candidate_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::{ComponentRegistry, ComponentSpec};
    use crate::domain::index::{TextIndex, TextRecord};
    use crate::infrastructure::index::{InMemoryTextIndex, InMemoryVectorStore};
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn pipeline() -> RetrievalPipeline {
        let text = Arc::new(InMemoryTextIndex::new());
        let records = [
            ("a", "rust ownership and borrowing rules"),
            ("b", "rust ownership"),
            ("c", "rust ownership"),
            ("d", "python decorators"),
        ]
        .into_iter()
        .map(|(id, content)| TextRecord {
            id: id.to_string(),
            content: content.to_string(),
            metadata: HashMap::new(),
        })
        .collect();
        text.upsert("docs", records).await.unwrap();

        let ctx = ComponentContext::new(Arc::new(ComponentRegistry::with_builtins().unwrap()))
            .with_vector_store(Arc::new(InMemoryVectorStore::new()))
            .with_text_index(text);

        RetrievalPipeline::new(ctx)
    }

    #[tokio::test]
    async fn test_full_text_with_chain() {
        let request = RetrievalRequest::new("rust ownership", "docs")
            .with_optimizer(ComponentSpec::new("max_results").with_option("limit", 1))
            .with_optimizer(ComponentSpec::new("dedup"));

        let response = pipeline()
            .await
            .retrieve(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.searcher, "full_text");
        assert_eq!(response.optimizers, vec!["dedup", "max_results"]);
        assert_eq!(response.candidates, 3);
        assert_eq!(response.results.len(), 1);
        assert!(response.results[0].score <= 1.0);
    }

    #[tokio::test]
    async fn test_invalid_request_fails_fast() {
        let request = RetrievalRequest::new("rust", "docs").with_top_k(0);

        let err = pipeline()
            .await
            .retrieve(&request, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_searcher_lists_keys() {
        let request =
            RetrievalRequest::new("rust", "docs").with_searcher(ComponentSpec::new("telepathic"));

        let err = pipeline()
            .await
            .retrieve(&request, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("semantic, full_text, hybrid"));
    }

    #[tokio::test]
    async fn test_cancelled_before_search() {
        let token = CancellationToken::new();
        token.cancel();

        let err = pipeline()
            .await
            .retrieve(&RetrievalRequest::new("rust", "docs"), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Cancelled { ref stage } if stage == "search"));
    }
}
