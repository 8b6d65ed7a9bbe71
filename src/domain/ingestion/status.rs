//! Run-status reporting boundary
//!
//! The pipeline reports every state transition of a document run through a
//! [`StatusReporter`]. Persisting those transitions is up to the host.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::pipeline::{IngestionStage, StageFailure};

/// One state transition of an ingestion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub run_id: String,
    pub document_id: String,
    pub collection: String,
    pub stage: IngestionStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn new(
        run_id: impl Into<String>,
        document_id: impl Into<String>,
        collection: impl Into<String>,
        stage: IngestionStage,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            document_id: document_id.into(),
            collection: collection.into(),
            stage,
            detail: None,
            at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_failure(self, failure: &StageFailure) -> Self {
        self.with_detail(failure.to_string())
    }
}

/// Sink for ingestion state transitions
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatusReporter: Send + Sync + Debug {
    async fn report(&self, update: StatusUpdate);
}
