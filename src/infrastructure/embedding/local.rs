//! In-process feature-hashing embedder

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::embedding::{Embedder, EmbeddingVector};
use crate::domain::DomainError;

pub const DEFAULT_LOCAL_MODEL: &str = "hash-embedding-base";

/// Built-in hashing models and their native dimensions
pub const LOCAL_MODELS: &[(&str, usize)] = &[
    ("hash-embedding-small", 256),
    ("hash-embedding-base", 384),
    ("hash-embedding-large", 768),
];

/// Signed feature hashing over lowercase unicode words, L2-normalized.
///
/// Deterministic across runs and platforms. An optional stop-word file
/// (one word per line) removes words before hashing.
#[derive(Debug, Clone)]
pub struct HashingModel {
    name: String,
    dimensions: usize,
    stop_words: Arc<HashSet<String>>,
}

impl HashingModel {
    pub fn new(name: impl Into<String>, dimensions: usize) -> Self {
        Self {
            name: name.into(),
            dimensions: dimensions.max(1),
            stop_words: Arc::new(HashSet::new()),
        }
    }

    /// Resolve a named model, with optional dimension override and stop-word file
    pub fn load(
        model: &str,
        dimensions: Option<usize>,
        model_path: Option<&str>,
    ) -> Result<Self, DomainError> {
        let native = LOCAL_MODELS
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, dims)| *dims)
            .ok_or_else(|| {
                let known: Vec<&str> = LOCAL_MODELS.iter().map(|(name, _)| *name).collect();
                DomainError::model_load(model, format!("unknown model (known: {})", known.join(", ")))
            })?;

        let dimensions = match dimensions {
            Some(0) => return Err(DomainError::model_load(model, "dimensions must be positive")),
            Some(dims) => dims,
            None => native,
        };

        let mut loaded = Self::new(model, dimensions);

        if let Some(path) = model_path {
            loaded.stop_words = Arc::new(Self::read_stop_words(model, Path::new(path))?);
        }

        debug!(model = %model, dimensions, "Loaded hashing model");

        Ok(loaded)
    }

    fn read_stop_words(model: &str, path: &Path) -> Result<HashSet<String>, DomainError> {
        if !path.exists() {
            return Err(DomainError::model_load(
                model,
                format!("model path '{}' does not exist", path.display()),
            ));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            DomainError::model_load(model, format!("cannot read '{}': {}", path.display(), e))
        })?;

        Ok(contents
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for word in text.unicode_words() {
            let word = word.to_lowercase();
            if self.stop_words.contains(&word) {
                continue;
            }

            let digest = Sha256::digest(word.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);

            let slot = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };

            vector[slot] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }
}

/// `local` embedder: no network, no failure mode after construction
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    model: HashingModel,
}

impl LocalEmbedder {
    pub fn new(model: HashingModel) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, DomainError> {
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, text)| EmbeddingVector::new(i, self.model.encode(text), self.model.name()))
            .collect())
    }

    fn model(&self) -> &str {
        self.model.name()
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.model.dimensions())
    }
}
