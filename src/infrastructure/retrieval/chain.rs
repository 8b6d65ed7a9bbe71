//! Ordered optimizer chain

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::component::{ComponentConfig, ComponentContext, ComponentFactory, ComponentSpec};
use crate::domain::retrieval::{ResultOptimizer, SearchResult};
use crate::domain::DomainError;

/// A resolved optimizer with the selection that produced it
#[derive(Debug, Clone)]
pub struct OptimizerEntry {
    pub optimizer: Arc<dyn ResultOptimizer>,
    pub order: i32,
    pub key: String,
    pub config: ComponentConfig,
}

/// Optimizers in execution order.
///
/// Built by a stable sort on `order`, so entries with equal order keep the
/// configured sequence. Folding stops as soon as a stage returns no results.
#[derive(Debug, Clone, Default)]
pub struct OptimizerChain {
    entries: Vec<OptimizerEntry>,
}

impl OptimizerChain {
    /// Resolve every `{type, config}` through the optimizer factory
    pub fn build(
        specs: &[ComponentSpec],
        factory: &ComponentFactory<dyn ResultOptimizer>,
        ctx: &ComponentContext,
    ) -> Result<Self, DomainError> {
        let mut entries = specs
            .iter()
            .map(|spec| {
                let optimizer = factory.create(&spec.key, &spec.config, ctx)?;
                Ok(OptimizerEntry {
                    order: optimizer.order(),
                    optimizer,
                    key: spec.key.clone(),
                    config: spec.config.clone(),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        entries.sort_by_key(|entry| entry.order);

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[OptimizerEntry] {
        &self.entries
    }

    /// Optimizer names in execution order
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.optimizer.name().to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn apply(
        &self,
        mut results: Vec<SearchResult>,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, DomainError> {
        for entry in &self.entries {
            if results.is_empty() {
                debug!(optimizer = %entry.key, "No results left, stopping optimizer chain");
                break;
            }

            if cancel.is_cancelled() {
                return Err(DomainError::cancelled(format!("optimize:{}", entry.key)));
            }

            let before = results.len();
            results = entry.optimizer.optimize(results, query).await?;

            debug!(
                optimizer = %entry.key,
                order = entry.order,
                before,
                after = results.len(),
                "Applied optimizer"
            );
        }

        Ok(results)
    }
}
