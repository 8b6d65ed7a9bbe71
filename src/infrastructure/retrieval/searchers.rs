//! Built-in searchers

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::embedding::Embedder;
use crate::domain::index::{TextIndex, VectorStore};
use crate::domain::retrieval::{sort_ranked, SearchRequest, SearchResult, Searcher};
use crate::domain::DomainError;

/// `semantic`: embeds the query and ranks by cosine similarity.
///
/// Raw cosine in [-1, 1] is mapped to `(cos + 1) / 2`. The embedder must be
/// the one used at ingestion time; nothing here can check that.
#[derive(Debug, Clone)]
pub struct SemanticSearcher {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl SemanticSearcher {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl Searcher for SemanticSearcher {
    fn name(&self) -> &'static str {
        "semantic"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, DomainError> {
        request.validate()?;

        let query = self
            .embedder
            .embed(std::slice::from_ref(&request.query))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::internal("Embedder returned no vector for the query"))?;

        let hits = self
            .store
            .query(&request.collection, &query.vector, request.top_k)
            .await?;

        let mut results: Vec<SearchResult> = hits
            .into_iter()
            .map(|hit| {
                let mut result = SearchResult::from(hit);
                result.score = ((result.score + 1.0) / 2.0).clamp(0.0, 1.0);
                result
            })
            .collect();

        sort_ranked(&mut results);

        debug!(collection = %request.collection, hits = results.len(), "Semantic search");

        Ok(results)
    }
}

/// `full_text`: BM25 over the text index, normalized by the top score
#[derive(Debug, Clone)]
pub struct FullTextSearcher {
    index: Arc<dyn TextIndex>,
}

impl FullTextSearcher {
    pub fn new(index: Arc<dyn TextIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Searcher for FullTextSearcher {
    fn name(&self) -> &'static str {
        "full_text"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, DomainError> {
        request.validate()?;

        let hits = self
            .index
            .query(&request.collection, &request.query, request.top_k)
            .await?;

        let best = hits.iter().map(|hit| hit.score).fold(0.0_f32, f32::max);

        let mut results: Vec<SearchResult> = hits
            .into_iter()
            .map(|hit| {
                let mut result = SearchResult::from(hit);
                result.score = if best > 0.0 {
                    (result.score / best).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                result
            })
            .collect();

        sort_ranked(&mut results);

        debug!(collection = %request.collection, hits = results.len(), "Full-text search");

        Ok(results)
    }
}

pub const DEFAULT_HYBRID_CANDIDATES: usize = 50;

/// `hybrid`: weighted union of a semantic and a full-text searcher.
///
/// Both sides are asked for `max(top_k, candidates)` results. A result found
/// by both scores `(w_s*s + w_t*t) / (w_s + w_t)`; a result found by one side
/// keeps that side's score.
#[derive(Debug, Clone)]
pub struct HybridSearcher {
    semantic: Arc<dyn Searcher>,
    text: Arc<dyn Searcher>,
    candidates: usize,
    semantic_weight: f32,
    text_weight: f32,
}

impl HybridSearcher {
    pub fn new(semantic: Arc<dyn Searcher>, text: Arc<dyn Searcher>) -> Self {
        Self {
            semantic,
            text,
            candidates: DEFAULT_HYBRID_CANDIDATES,
            semantic_weight: 0.5,
            text_weight: 0.5,
        }
    }

    pub fn with_candidates(mut self, candidates: usize) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_weights(mut self, semantic_weight: f32, text_weight: f32) -> Result<Self, DomainError> {
        if semantic_weight < 0.0 || text_weight < 0.0 || semantic_weight + text_weight <= 0.0 {
            return Err(DomainError::validation(
                "hybrid weights must be non-negative with a positive sum",
            ));
        }

        self.semantic_weight = semantic_weight;
        self.text_weight = text_weight;
        Ok(self)
    }

    fn combine(&self, semantic: Vec<SearchResult>, text: Vec<SearchResult>) -> Vec<SearchResult> {
        let mut text_by_id: HashMap<String, SearchResult> =
            text.into_iter().map(|r| (r.id.clone(), r)).collect();

        let total = self.semantic_weight + self.text_weight;
        let mut combined = Vec::with_capacity(semantic.len() + text_by_id.len());

        for mut result in semantic {
            let semantic_score = result.score;
            result.metadata.insert("semantic_score".to_string(), semantic_score.into());

            if let Some(text_hit) = text_by_id.remove(&result.id) {
                result.metadata.insert("text_score".to_string(), text_hit.score.into());
                result.score =
                    (self.semantic_weight * semantic_score + self.text_weight * text_hit.score) / total;
            }

            combined.push(result);
        }

        for (_, mut result) in text_by_id {
            result.metadata.insert("text_score".to_string(), result.score.into());
            combined.push(result);
        }

        combined
    }
}

#[async_trait]
impl Searcher for HybridSearcher {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, DomainError> {
        request.validate()?;

        let candidate_request = request
            .clone()
            .with_top_k(request.top_k.max(self.candidates));

        let (semantic, text) = futures::try_join!(
            self.semantic.search(&candidate_request),
            self.text.search(&candidate_request)
        )?;

        let mut results = self.combine(semantic, text);
        sort_ranked(&mut results);
        results.truncate(request.top_k);

        Ok(results)
    }
}
