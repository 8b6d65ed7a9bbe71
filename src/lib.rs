//! PMP RAG Pipeline
//!
//! A pluggable document ingestion and retrieval engine:
//! - Components (parsers, chunkers, embedders, indexers, searchers and
//!   result optimizers) created by key with schema-validated options
//! - Ingestion pipeline: parse, chunk, embed and index with status reporting
//! - Retrieval pipeline: search followed by an ordered optimizer chain
//! - In-memory vector store and BM25 text index backends

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::component::{ComponentContext, ComponentRegistry, ComponentSpec};
pub use domain::DomainError;
pub use infrastructure::ingestion::IngestionPipeline;
pub use infrastructure::retrieval::RetrievalPipeline;
