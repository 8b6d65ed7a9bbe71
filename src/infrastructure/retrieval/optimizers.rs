//! Built-in result optimizers

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::retrieval::{sort_ranked, ResultOptimizer, SearchResult};
use crate::domain::DomainError;
use crate::infrastructure::index::tokenize;

pub const SCORE_THRESHOLD_ORDER: i32 = 20;
pub const DEDUP_ORDER: i32 = 50;
pub const RERANK_ORDER: i32 = 80;
pub const MAX_RESULTS_ORDER: i32 = 100;

/// `score_threshold`: drops results scoring below `threshold`
#[derive(Debug, Clone)]
pub struct ScoreThresholdOptimizer {
    threshold: f32,
    order: i32,
}

impl ScoreThresholdOptimizer {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            order: SCORE_THRESHOLD_ORDER,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

#[async_trait]
impl ResultOptimizer for ScoreThresholdOptimizer {
    fn name(&self) -> &str {
        "score_threshold"
    }

    fn order(&self) -> i32 {
        self.order
    }

    async fn optimize(
        &self,
        results: Vec<SearchResult>,
        _query: &str,
    ) -> Result<Vec<SearchResult>, DomainError> {
        Ok(results
            .into_iter()
            .filter(|r| r.score >= self.threshold)
            .collect())
    }
}

/// What makes two results duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupKey {
    Id,
    Content,
    /// Lowercased, whitespace collapsed
    NormalizedContent,
}

impl DedupKey {
    fn key_for(&self, result: &SearchResult) -> String {
        match self {
            Self::Id => result.id.clone(),
            Self::Content => result.content.clone(),
            Self::NormalizedContent => result
                .content
                .split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// `dedup`: keeps the first occurrence of each key
#[derive(Debug, Clone)]
pub struct DedupOptimizer {
    key: DedupKey,
    order: i32,
}

impl DedupOptimizer {
    pub fn new(key: DedupKey) -> Self {
        Self {
            key,
            order: DEDUP_ORDER,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

#[async_trait]
impl ResultOptimizer for DedupOptimizer {
    fn name(&self) -> &str {
        "dedup"
    }

    fn order(&self) -> i32 {
        self.order
    }

    async fn optimize(
        &self,
        results: Vec<SearchResult>,
        _query: &str,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let mut seen = HashSet::new();

        Ok(results
            .into_iter()
            .filter(|r| seen.insert(self.key.key_for(r)))
            .collect())
    }
}

/// `rerank`: blends the score with query-term overlap.
///
/// The overlap signal is the fraction of distinct query words present in the
/// result content. New score is `weight * signal + (1 - weight) * score`.
#[derive(Debug, Clone)]
pub struct RerankOptimizer {
    weight: f32,
    order: i32,
}

impl RerankOptimizer {
    pub fn new(weight: f32) -> Self {
        Self {
            weight: weight.clamp(0.0, 1.0),
            order: RERANK_ORDER,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

#[async_trait]
impl ResultOptimizer for RerankOptimizer {
    fn name(&self) -> &str {
        "rerank"
    }

    fn order(&self) -> i32 {
        self.order
    }

    async fn optimize(
        &self,
        mut results: Vec<SearchResult>,
        query: &str,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let terms: HashSet<String> = tokenize(query).into_iter().collect();
        if terms.is_empty() {
            return Ok(results);
        }

        for result in &mut results {
            let words: HashSet<String> = tokenize(&result.content).into_iter().collect();
            let signal = terms.intersection(&words).count() as f32 / terms.len() as f32;

            result.score = self.weight * signal + (1.0 - self.weight) * result.score;
        }

        sort_ranked(&mut results);
        Ok(results)
    }
}

/// `max_results`: keeps the first `limit` results
#[derive(Debug, Clone)]
pub struct MaxResultsOptimizer {
    limit: usize,
    order: i32,
}

impl MaxResultsOptimizer {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            order: MAX_RESULTS_ORDER,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

#[async_trait]
impl ResultOptimizer for MaxResultsOptimizer {
    fn name(&self) -> &str {
        "max_results"
    }

    fn order(&self) -> i32 {
        self.order
    }

    async fn optimize(
        &self,
        mut results: Vec<SearchResult>,
        _query: &str,
    ) -> Result<Vec<SearchResult>, DomainError> {
        results.truncate(self.limit);
        Ok(results)
    }
}
