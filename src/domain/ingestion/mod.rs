//! Document ingestion domain types and traits
//!
//! This module provides:
//! - `DocumentParser` trait for parsing various document formats
//! - `ChunkingStrategy` trait for splitting documents into chunks
//! - Configuration, state machine and result types for the ingestion pipeline
//! - `StatusReporter` boundary for run-state transitions

pub mod chunker;
pub mod parser;
pub mod pipeline;
pub mod status;
pub mod validation;

// Re-export main types
pub use chunker::{Chunk, ChunkingStrategy};
pub use parser::{DocumentMetadata, DocumentParser, ParsedDocument, ParserContent, ParserInput};
pub use pipeline::{
    BatchIngestionResult, IngestionConfig, IngestionResult, IngestionStage, PipelineStep,
    StageFailure,
};
pub use status::{StatusReporter, StatusUpdate};
pub use validation::{guess_mime_type, validate_collection, validate_document_id};

// Re-export mocks for testing
#[cfg(test)]
pub use chunker::mock::MockChunkingStrategy;
#[cfg(test)]
pub use parser::mock::MockDocumentParser;
#[cfg(test)]
pub use status::MockStatusReporter;
