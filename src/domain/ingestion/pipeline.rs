//! Ingestion pipeline types and configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::validation::{validate_collection, validate_document_id};
use crate::domain::component::ComponentSpec;
use crate::domain::DomainError;

/// Ingestion state machine.
///
/// `Received -> Parsed -> Chunked -> Embedded -> Indexed -> Complete`, with
/// `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStage {
    Received,
    Parsed,
    Chunked,
    Embedded,
    Indexed,
    Complete,
    Failed,
}

impl IngestionStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Whether `next` is a legal transition from this state
    pub fn can_transition_to(&self, next: IngestionStage) -> bool {
        if self.is_terminal() {
            return false;
        }

        if next == Self::Failed {
            return true;
        }

        matches!(
            (self, next),
            (Self::Received, Self::Parsed)
                | (Self::Parsed, Self::Chunked)
                | (Self::Chunked, Self::Embedded)
                | (Self::Embedded, Self::Indexed)
                | (Self::Indexed, Self::Complete)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Parsed => "parsed",
            Self::Chunked => "chunked",
            Self::Embedded => "embedded",
            Self::Indexed => "indexed",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline step that was running when a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Setup,
    Parse,
    Chunk,
    Embed,
    Index,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Setup => "setup",
            Self::Parse => "parse",
            Self::Chunk => "chunk",
            Self::Embed => "embed",
            Self::Index => "index",
        };
        f.write_str(name)
    }
}

/// Configuration for ingesting one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Target collection in every index backend
    pub collection: String,
    #[serde(default = "default_parser")]
    pub parser: ComponentSpec,
    #[serde(default = "default_chunker")]
    pub chunker: ComponentSpec,
    /// Skipped when absent; chunks are indexed without vectors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedder: Option<ComponentSpec>,
    #[serde(default = "default_indexers")]
    pub indexers: Vec<ComponentSpec>,
    /// Stable document identifier; derived from the filename when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Custom metadata added to every chunk
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_parser() -> ComponentSpec {
    ComponentSpec::new("auto")
}

fn default_chunker() -> ComponentSpec {
    ComponentSpec::new("fixed_size")
}

fn default_indexers() -> Vec<ComponentSpec> {
    vec![ComponentSpec::new("search_index")]
}

impl IngestionConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            parser: default_parser(),
            chunker: default_chunker(),
            embedder: None,
            indexers: default_indexers(),
            document_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_parser(mut self, parser: ComponentSpec) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_chunker(mut self, chunker: ComponentSpec) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_embedder(mut self, embedder: ComponentSpec) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_indexers(mut self, indexers: Vec<ComponentSpec>) -> Self {
        self.indexers = indexers;
        self
    }

    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Input contract checks that run before any component is created
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_collection(&self.collection)?;

        if self.indexers.is_empty() {
            return Err(DomainError::validation("at least one indexer is required"));
        }

        if let Some(ref id) = self.document_id {
            validate_document_id(id)?;
        }

        Ok(())
    }
}

/// Stage failure with the step and component that caused it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageFailure {
    pub step: PipelineStep,
    /// Component key, e.g. `"remote"` for the remote embedder
    pub component: String,
    pub message: String,
    /// Whether re-running the document later may succeed
    pub retryable: bool,
}

impl StageFailure {
    pub fn new(step: PipelineStep, component: impl Into<String>, error: &DomainError) -> Self {
        Self {
            step,
            component: component.into(),
            message: error.to_string(),
            retryable: error.is_transient()
                || matches!(error, DomainError::EmbeddingProvider { .. }),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed in '{}': {}", self.step, self.component, self.message)
    }
}

/// Result of ingesting a single document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResult {
    pub document_id: String,
    pub collection: String,
    /// Final state: `Complete` or `Failed`
    pub state: IngestionStage,
    /// Last state reached before completion or failure
    pub last_stage: IngestionStage,
    pub chunks_created: usize,
    pub chunks_embedded: usize,
    /// Ids written to the index backends, in chunk order
    #[serde(default)]
    pub chunk_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<StageFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestionResult {
    pub fn is_success(&self) -> bool {
        self.state == IngestionStage::Complete
    }

    pub fn has_errors(&self) -> bool {
        self.failure.is_some()
    }
}

/// Result of batch ingestion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchIngestionResult {
    pub total_documents: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<IngestionResult>,
}

impl BatchIngestionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result to the batch
    pub fn add(&mut self, result: IngestionResult) {
        self.total_documents += 1;

        if result.is_success() {
            self.successful += 1;
        } else {
            self.failed += 1;
        }

        self.results.push(result);
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn total_chunks_created(&self) -> usize {
        self.results.iter().map(|r| r.chunks_created).sum()
    }
}
