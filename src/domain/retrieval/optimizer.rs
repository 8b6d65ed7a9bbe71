//! Result optimizer trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::searcher::SearchResult;
use crate::domain::DomainError;

/// Post-processing stage applied to search results.
///
/// Stages run in ascending `order`; each receives the previous stage's
/// output and returns a new sequence. Every optimizer must handle empty
/// input.
#[async_trait]
pub trait ResultOptimizer: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Execution order, lower runs first
    fn order(&self) -> i32;

    async fn optimize(
        &self,
        results: Vec<SearchResult>,
        query: &str,
    ) -> Result<Vec<SearchResult>, DomainError>;
}
