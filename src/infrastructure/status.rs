//! Status reporters for ingestion runs

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ingestion::{IngestionStage, StatusReporter, StatusUpdate};

/// Logs every transition; failures at `warn`
#[derive(Debug, Clone, Default)]
pub struct TracingStatusReporter;

impl TracingStatusReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StatusReporter for TracingStatusReporter {
    async fn report(&self, update: StatusUpdate) {
        if update.stage == IngestionStage::Failed {
            warn!(
                run_id = %update.run_id,
                document_id = %update.document_id,
                collection = %update.collection,
                stage = %update.stage,
                detail = update.detail.as_deref().unwrap_or_default(),
                "Ingestion run failed"
            );
        } else {
            info!(
                run_id = %update.run_id,
                document_id = %update.document_id,
                collection = %update.collection,
                stage = %update.stage,
                "Ingestion run advanced"
            );
        }
    }
}

/// Keeps every update in memory, in arrival order
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusReporter {
    updates: Arc<Mutex<Vec<StatusUpdate>>>,
}

impl InMemoryStatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stages reported for one run
    pub fn stages(&self, run_id: &str) -> Vec<IngestionStage> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|u| u.run_id == run_id)
            .map(|u| u.stage)
            .collect()
    }
}

#[async_trait]
impl StatusReporter for InMemoryStatusReporter {
    async fn report(&self, update: StatusUpdate) {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(update);
    }
}
