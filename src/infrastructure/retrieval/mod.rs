//! Retrieval infrastructure
//!
//! Searchers, result optimizers, the optimizer chain and the retrieval
//! pipeline that ties them together.

mod chain;
mod factory;
mod optimizers;
mod pipeline;
mod searchers;

pub use chain::{OptimizerChain, OptimizerEntry};
pub use factory::{optimizer_factory, register_optimizers, register_searchers, searcher_factory};
pub use optimizers::{
    DedupKey, DedupOptimizer, MaxResultsOptimizer, RerankOptimizer, ScoreThresholdOptimizer,
};
pub use pipeline::RetrievalPipeline;
pub use searchers::{FullTextSearcher, HybridSearcher, SemanticSearcher};
