//! Retrieval pipeline request and response types

use serde::{Deserialize, Serialize};

use super::searcher::{SearchRequest, SearchResult};
use crate::domain::component::ComponentSpec;
use crate::domain::DomainError;

/// One retrieval call: searcher selection plus optimizer chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub query: String,
    pub collection: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_searcher")]
    pub searcher: ComponentSpec,
    /// Optimizer entries in configured order; executed by ascending `order`
    #[serde(default)]
    pub optimizers: Vec<ComponentSpec>,
}

fn default_top_k() -> usize {
    10
}

fn default_searcher() -> ComponentSpec {
    ComponentSpec::new("full_text")
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            collection: collection.into(),
            top_k: default_top_k(),
            searcher: default_searcher(),
            optimizers: Vec::new(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_searcher(mut self, searcher: ComponentSpec) -> Self {
        self.searcher = searcher;
        self
    }

    pub fn with_optimizer(mut self, optimizer: ComponentSpec) -> Self {
        self.optimizers.push(optimizer);
        self
    }

    pub fn search_request(&self) -> SearchRequest {
        SearchRequest::new(self.query.clone(), self.collection.clone()).with_top_k(self.top_k)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.search_request().validate()
    }
}

/// Ranked results of a retrieval call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResponse {
    pub results: Vec<SearchResult>,
    pub searcher: String,
    /// Optimizer names in execution order
    pub optimizers: Vec<String>,
    /// Result count straight out of the searcher
    pub candidates: usize,
}
