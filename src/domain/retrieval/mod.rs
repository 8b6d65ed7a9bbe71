//! Retrieval domain: searcher and optimizer components, pipeline types

mod optimizer;
mod pipeline;
mod searcher;

pub use optimizer::ResultOptimizer;
pub use pipeline::{RetrievalRequest, RetrievalResponse};
pub use searcher::{compare_ranked, sort_ranked, SearchRequest, SearchResult, Searcher};
