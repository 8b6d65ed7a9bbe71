//! Ingest command - runs the ingestion pipeline over local files

use std::path::PathBuf;

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::component::ComponentSpec;
use crate::domain::ingestion::{BatchIngestionResult, IngestionConfig};
use crate::infrastructure::index::{SEARCH_INDEX_INDEXER_KEY, VECTOR_STORE_INDEXER_KEY};
use crate::infrastructure::ingestion::IngestionPipeline;

use super::workspace::{cancel_on_interrupt, context, embedder_spec, print_json, read_inputs};

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Files to ingest; each becomes one document named after the file
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Target collection (defaults to pipeline.default_collection)
    #[arg(long)]
    pub collection: Option<String>,

    /// Parser key
    #[arg(long, default_value = "auto")]
    pub parser: String,

    /// Chunker key
    #[arg(long, default_value = "fixed_size")]
    pub chunker: String,

    /// Chunk size passed to the chunker
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Embedder key (`local` or `remote`); enables the vector store indexer
    #[arg(long)]
    pub embedder: Option<String>,
}

impl IngestArgs {
    pub fn collection(&self, config: &AppConfig) -> String {
        self.collection
            .clone()
            .unwrap_or_else(|| config.pipeline.default_collection.clone())
    }

    pub fn ingestion_config(&self, config: &AppConfig) -> IngestionConfig {
        let mut chunker = ComponentSpec::new(&self.chunker);
        if let Some(size) = self.chunk_size {
            chunker = chunker.with_option("chunk_size", size);
        }

        let mut indexers = vec![ComponentSpec::new(SEARCH_INDEX_INDEXER_KEY)];
        let mut ingestion = IngestionConfig::new(self.collection(config))
            .with_parser(ComponentSpec::new(&self.parser))
            .with_chunker(chunker);

        if let Some(embedder) = &self.embedder {
            ingestion = ingestion.with_embedder(embedder_spec(embedder, config));
            indexers.push(ComponentSpec::new(VECTOR_STORE_INDEXER_KEY));
        }

        ingestion.with_indexers(indexers)
    }

    /// Run the ingestion over `pipeline`, failing on the first cancelled run
    pub async fn ingest(
        &self,
        pipeline: &IngestionPipeline,
        config: &AppConfig,
        cancel: &CancellationToken,
    ) -> anyhow::Result<BatchIngestionResult> {
        let inputs = read_inputs(&self.files).await?;
        let ingestion = self.ingestion_config(config);

        let batch = pipeline.ingest_batch(inputs, &ingestion, cancel).await?;

        info!(
            collection = %ingestion.collection,
            documents = batch.results.len(),
            chunks = batch.total_chunks_created(),
            "Ingestion finished"
        );

        Ok(batch)
    }
}

pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    let mut pipeline = IngestionPipeline::new(context()?);
    if let Some(timeout) = config.pipeline.call_timeout() {
        pipeline = pipeline.with_call_timeout(timeout);
    }

    let batch = args.ingest(&pipeline, &config, &cancel_on_interrupt()).await?;
    print_json(&batch)?;

    if !batch.is_success() {
        anyhow::bail!("{} document(s) failed", batch.failed);
    }

    Ok(())
}
