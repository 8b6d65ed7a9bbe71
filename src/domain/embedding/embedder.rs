//! Embedder component trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Vector produced for one input text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    /// Position of the source text (and therefore its chunk) in the input
    pub index: usize,
    pub vector: Vec<f32>,
    pub model: String,
    pub dimensions: usize,
}

impl EmbeddingVector {
    pub fn new(index: usize, vector: Vec<f32>, model: impl Into<String>) -> Self {
        let dimensions = vector.len();
        Self {
            index,
            vector,
            model: model.into(),
            dimensions,
        }
    }
}

/// Turns texts into vectors.
///
/// The output preserves input order and arity: one vector per input text,
/// duplicates included.
#[async_trait]
pub trait Embedder: Send + Sync + Debug {
    async fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, DomainError>;

    /// Model identifier recorded on every vector
    fn model(&self) -> &str;

    /// Output dimensionality, when known before the first call
    fn dimensions(&self) -> Option<usize>;
}

/// Cosine similarity between two vectors; 0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_embedding_vector_dimensions() {
        let vector = EmbeddingVector::new(2, vec![0.1, 0.2, 0.3], "m");
        assert_eq!(vector.dimensions, 3);
        assert_eq!(vector.index, 2);
    }
}
