//! Embedding providers and embedders
//!
//! `remote` wraps any [`EmbeddingProvider`](crate::domain::embedding::EmbeddingProvider)
//! (OpenAI-compatible over HTTP by default) with batching and retries.
//! `local` runs a deterministic hashing model in-process.

mod factory;
mod http_client;
mod local;
mod openai;
mod remote;

pub use factory::{embedder_factory, register_embedders, LOCAL_EMBEDDER_KEY, REMOTE_EMBEDDER_KEY};
pub use http_client::{HttpClient, HttpClientTrait};
pub use local::{HashingModel, LocalEmbedder, DEFAULT_LOCAL_MODEL, LOCAL_MODELS};
pub use openai::{OpenAiEmbeddingProvider, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
pub use remote::{RemoteEmbedder, RetryPolicy, DEFAULT_BATCH_SIZE};

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
