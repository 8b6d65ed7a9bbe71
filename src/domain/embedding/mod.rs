//! Embedding domain models and traits
//!
//! `EmbeddingProvider` is the external capability; `Embedder` is the
//! pipeline component built on top of it (or running in-process).

mod embedder;
mod provider;

pub use embedder::{cosine_similarity, Embedder, EmbeddingVector};
pub use provider::{
    Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage,
};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
