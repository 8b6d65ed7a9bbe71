//! Ingestion pipeline: parse, chunk, embed, index

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::component::ComponentContext;
use crate::domain::embedding::{Embedder, EmbeddingVector};
use crate::domain::index::{IndexItem, Indexer};
use crate::domain::ingestion::{
    BatchIngestionResult, Chunk, ChunkingStrategy, DocumentParser, IngestionConfig,
    IngestionResult, IngestionStage, ParserInput, PipelineStep, StageFailure, StatusReporter,
    StatusUpdate,
};
use crate::domain::DomainError;
use crate::infrastructure::guard::guarded;
use crate::infrastructure::status::TracingStatusReporter;

/// Deterministic id of a chunk, stable across re-ingestion
pub fn chunk_id(document_id: &str, index: usize) -> String {
    format!("{}_chunk_{}", document_id, index)
}

/// Chunk ids deleted per call when pruning leftovers of a longer version
const PRUNE_BATCH: usize = 64;

/// Components resolved for one run, each with the key that selected it
#[derive(Debug)]
struct RunComponents {
    parser: (String, Arc<dyn DocumentParser>),
    chunker: (String, Arc<dyn ChunkingStrategy>),
    embedder: Option<(String, Arc<dyn Embedder>)>,
    indexers: Vec<(String, Arc<dyn Indexer>)>,
}

/// State of one document run; reports every transition
struct Run<'a> {
    run_id: String,
    document_id: String,
    collection: String,
    stage: IngestionStage,
    reporter: &'a dyn StatusReporter,
    result: IngestionResult,
}

impl<'a> Run<'a> {
    async fn start(
        reporter: &'a dyn StatusReporter,
        document_id: String,
        collection: String,
    ) -> Run<'a> {
        let now = Utc::now();
        let run = Run {
            run_id: uuid::Uuid::new_v4().to_string(),
            stage: IngestionStage::Received,
            reporter,
            result: IngestionResult {
                document_id: document_id.clone(),
                collection: collection.clone(),
                state: IngestionStage::Received,
                last_stage: IngestionStage::Received,
                chunks_created: 0,
                chunks_embedded: 0,
                chunk_ids: Vec::new(),
                failure: None,
                started_at: now,
                finished_at: now,
            },
            document_id,
            collection,
        };

        run.reporter.report(run.update(IngestionStage::Received)).await;
        run
    }

    fn update(&self, stage: IngestionStage) -> StatusUpdate {
        StatusUpdate::new(&self.run_id, &self.document_id, &self.collection, stage)
    }

    async fn advance(&mut self, next: IngestionStage) -> Result<(), DomainError> {
        if !self.stage.can_transition_to(next) {
            return Err(DomainError::internal(format!(
                "Illegal ingestion transition {} -> {}",
                self.stage, next
            )));
        }

        self.stage = next;
        self.result.last_stage = next;
        self.reporter.report(self.update(next)).await;
        Ok(())
    }

    async fn fail(mut self, failure: StageFailure) -> IngestionResult {
        error!(
            document_id = %self.document_id,
            collection = %self.collection,
            stage = %failure.step,
            component = %failure.component,
            error = %failure.message,
            "Ingestion failed"
        );

        self.reporter
            .report(self.update(IngestionStage::Failed).with_failure(&failure))
            .await;

        self.result.state = IngestionStage::Failed;
        self.result.failure = Some(failure);
        self.result.finished_at = Utc::now();
        self.result
    }

    async fn complete(mut self) -> Result<IngestionResult, DomainError> {
        self.advance(IngestionStage::Complete).await?;
        self.result.state = IngestionStage::Complete;
        self.result.finished_at = Utc::now();
        Ok(self.result)
    }
}

/// Runs documents through parse -> chunk -> embed -> index.
///
/// Components are created from the context's registry before the first
/// stage, so configuration errors are returned as `Err` without touching any
/// backend. A failing stage stops the run and is reported in
/// [`IngestionResult::failure`]; index writes of earlier indexers are kept.
/// Cancellation is returned as `Err(Cancelled)` after the run is reported
/// failed.
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    ctx: ComponentContext,
    reporter: Arc<dyn StatusReporter>,
    call_timeout: Option<Duration>,
}

impl IngestionPipeline {
    pub fn new(ctx: ComponentContext) -> Self {
        Self {
            ctx,
            reporter: Arc::new(TracingStatusReporter::new()),
            call_timeout: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn StatusReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Bound each embedder and indexer call
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    fn resolve(&self, config: &IngestionConfig) -> Result<RunComponents, DomainError> {
        let registry = self.ctx.registry();

        let parser = registry
            .parsers()?
            .create(&config.parser.key, &config.parser.config, &self.ctx)?;
        let chunker = registry
            .chunkers()?
            .create(&config.chunker.key, &config.chunker.config, &self.ctx)?;

        let embedder = match config.embedder {
            Some(ref spec) => Some((
                spec.key.clone(),
                registry.embedders()?.create(&spec.key, &spec.config, &self.ctx)?,
            )),
            None => None,
        };

        let indexer_factory = registry.indexers()?;
        let indexers = config
            .indexers
            .iter()
            .map(|spec| {
                indexer_factory
                    .create(&spec.key, &spec.config, &self.ctx)
                    .map(|indexer| (spec.key.clone(), indexer))
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(RunComponents {
            parser: (config.parser.key.clone(), parser),
            chunker: (config.chunker.key.clone(), chunker),
            embedder,
            indexers,
        })
    }

    /// Id from the config or the filename; `None` means a random id
    fn declared_document_id(input: &ParserInput, config: &IngestionConfig) -> Option<String> {
        config
            .document_id
            .clone()
            .or_else(|| input.filename.clone())
    }

    /// Ingest a single document
    pub async fn ingest(
        &self,
        input: ParserInput,
        config: &IngestionConfig,
        cancel: &CancellationToken,
    ) -> Result<IngestionResult, DomainError> {
        config.validate()?;
        let components = self.resolve(config)?;

        let document_id = Self::declared_document_id(&input, config)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut run = Run::start(self.reporter.as_ref(), document_id.clone(), config.collection.clone()).await;

        let (parser_key, parser) = &components.parser;
        let parsed = match parser.parse(input).await {
            Ok(parsed) => parsed,
            Err(e) => return Ok(run.fail(StageFailure::new(PipelineStep::Parse, parser_key, &e)).await),
        };
        run.advance(IngestionStage::Parsed).await?;

        let (chunker_key, chunker) = &components.chunker;
        let chunks = match chunker.chunk(&parsed.content) {
            Ok(chunks) => chunks,
            Err(e) => return Ok(run.fail(StageFailure::new(PipelineStep::Chunk, chunker_key, &e)).await),
        };
        run.result.chunks_created = chunks.len();
        run.advance(IngestionStage::Chunked).await?;

        let vectors = match components.embedder {
            Some((ref key, ref embedder)) if !chunks.is_empty() => {
                match self.embed(embedder.as_ref(), &chunks, cancel).await {
                    Ok(vectors) => vectors,
                    Err(e) => return self.stop(run, PipelineStep::Embed, key, e).await,
                }
            }
            _ => Vec::new(),
        };
        run.result.chunks_embedded = vectors.len();
        run.advance(IngestionStage::Embedded).await?;

        let mut metadata = parsed.metadata.to_json_map();
        metadata.extend(config.metadata.clone());
        metadata.insert("document_id".to_string(), document_id.clone().into());

        let items = build_items(&document_id, chunks, vectors, &metadata);
        let chunk_ids: Vec<String> = items.iter().map(|item| item.id.clone()).collect();

        if !items.is_empty() {
            for (key, indexer) in &components.indexers {
                let written = guarded(
                    "index",
                    self.call_timeout,
                    cancel,
                    indexer.index(&config.collection, items.clone()),
                )
                .await;

                if let Err(e) = written {
                    return self.stop(run, PipelineStep::Index, key, e).await;
                }
            }
        }

        for (key, indexer) in &components.indexers {
            let pruned = self
                .prune_stale_chunks(indexer.as_ref(), &config.collection, &document_id, items.len(), cancel)
                .await;

            if let Err(e) = pruned {
                return self.stop(run, PipelineStep::Index, key, e).await;
            }
        }
        run.result.chunk_ids = chunk_ids;
        run.advance(IngestionStage::Indexed).await?;

        info!(
            document_id = %document_id,
            collection = %config.collection,
            chunks = run.result.chunks_created,
            embedded = run.result.chunks_embedded,
            "Document ingested"
        );

        run.complete().await
    }

    async fn embed(
        &self,
        embedder: &dyn Embedder,
        chunks: &[Chunk],
        cancel: &CancellationToken,
    ) -> Result<Vec<EmbeddingVector>, DomainError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let mut vectors = guarded("embed", self.call_timeout, cancel, embedder.embed(&texts)).await?;

        if vectors.len() != chunks.len() {
            return Err(DomainError::internal(format!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        vectors.sort_by_key(|v| v.index);
        Ok(vectors)
    }

    /// Delete chunk ids from `from` upward, left by an earlier and longer
    /// version of the same document. Chunk ids are contiguous, so the first
    /// short batch ends the scan.
    async fn prune_stale_chunks(
        &self,
        indexer: &dyn Indexer,
        collection: &str,
        document_id: &str,
        from: usize,
        cancel: &CancellationToken,
    ) -> Result<usize, DomainError> {
        let mut start = from;
        let mut pruned = 0;

        loop {
            let ids: Vec<String> = (start..start + PRUNE_BATCH)
                .map(|n| chunk_id(document_id, n))
                .collect();

            let removed = guarded("index", self.call_timeout, cancel, indexer.delete(collection, &ids)).await?;
            pruned += removed;

            if removed < PRUNE_BATCH {
                break;
            }
            start += PRUNE_BATCH;
        }

        if pruned > 0 {
            debug!(
                document_id = %document_id,
                collection = %collection,
                indexer = indexer.name(),
                pruned,
                "Pruned stale chunks"
            );
        }

        Ok(pruned)
    }

    /// Fail the run; cancellation propagates as an error
    async fn stop(
        &self,
        run: Run<'_>,
        step: PipelineStep,
        component: &str,
        error: DomainError,
    ) -> Result<IngestionResult, DomainError> {
        let result = run.fail(StageFailure::new(step, component, &error)).await;

        match error {
            DomainError::Cancelled { .. } => Err(error),
            _ => Ok(result),
        }
    }

    /// Ingest documents one after another with the same configuration.
    ///
    /// Two inputs resolving to the same document id would overwrite each
    /// other, so such a batch is rejected before any document runs.
    pub async fn ingest_batch(
        &self,
        inputs: Vec<ParserInput>,
        config: &IngestionConfig,
        cancel: &CancellationToken,
    ) -> Result<BatchIngestionResult, DomainError> {
        let mut seen = HashSet::new();

        for input in &inputs {
            if let Some(id) = Self::declared_document_id(input, config) {
                if !seen.insert(id.clone()) {
                    return Err(DomainError::validation(format!(
                        "Duplicate document id '{}' in batch",
                        id
                    )));
                }
            }
        }

        let mut batch = BatchIngestionResult::new();

        for input in inputs {
            batch.add(self.ingest(input, config, cancel).await?);
        }

        Ok(batch)
    }

    /// Remove the chunks a previous ingestion wrote, from every configured
    /// indexer. Returns the total number of records removed.
    pub async fn delete_document(
        &self,
        previous: &IngestionResult,
        config: &IngestionConfig,
        cancel: &CancellationToken,
    ) -> Result<usize, DomainError> {
        validate_collection_match(previous, config)?;

        let indexer_factory = self.ctx.registry().indexers()?;
        let mut removed = 0;

        for spec in &config.indexers {
            let indexer = indexer_factory.create(&spec.key, &spec.config, &self.ctx)?;
            removed += guarded(
                "delete",
                self.call_timeout,
                cancel,
                indexer.delete(&previous.collection, &previous.chunk_ids),
            )
            .await?;
        }

        info!(
            document_id = %previous.document_id,
            collection = %previous.collection,
            removed,
            "Document deleted"
        );

        Ok(removed)
    }
}

fn validate_collection_match(
    previous: &IngestionResult,
    config: &IngestionConfig,
) -> Result<(), DomainError> {
    if previous.collection != config.collection {
        return Err(DomainError::validation(format!(
            "document '{}' was ingested into '{}', not '{}'",
            previous.document_id, previous.collection, config.collection
        )));
    }
    Ok(())
}

fn build_items(
    document_id: &str,
    chunks: Vec<Chunk>,
    vectors: Vec<EmbeddingVector>,
    metadata: &HashMap<String, serde_json::Value>,
) -> Vec<IndexItem> {
    let mut vectors = vectors.into_iter();

    chunks
        .into_iter()
        .map(|chunk| {
            let item = IndexItem::new(chunk_id(document_id, chunk.index), chunk)
                .with_metadata(metadata.clone());

            match vectors.next() {
                Some(vector) => item.with_embedding(vector),
                None => item,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::{ComponentRegistry, ComponentSpec};
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::index::{TextIndex, VectorStore};
    use crate::domain::ingestion::MockStatusReporter;
    use crate::infrastructure::index::{InMemoryTextIndex, InMemoryVectorStore};
    use crate::infrastructure::status::InMemoryStatusReporter;

    struct Harness {
        pipeline: IngestionPipeline,
        vectors: Arc<InMemoryVectorStore>,
        text: Arc<InMemoryTextIndex>,
        reporter: InMemoryStatusReporter,
    }

    fn harness_with(provider: Option<Arc<MockEmbeddingProvider>>) -> Harness {
        let vectors = Arc::new(InMemoryVectorStore::new());
        let text = Arc::new(InMemoryTextIndex::new());
        let reporter = InMemoryStatusReporter::new();

        let mut ctx = ComponentContext::new(Arc::new(ComponentRegistry::with_builtins().unwrap()))
            .with_vector_store(vectors.clone())
            .with_text_index(text.clone());
        if let Some(provider) = provider {
            ctx = ctx.with_embedding_provider(provider);
        }

        Harness {
            pipeline: IngestionPipeline::new(ctx).with_reporter(Arc::new(reporter.clone())),
            vectors,
            text,
            reporter,
        }
    }

    fn harness() -> Harness {
        harness_with(None)
    }

    fn small_chunks(config: IngestionConfig) -> IngestionConfig {
        config.with_chunker(
            ComponentSpec::new("fixed_size")
                .with_option("chunk_size", 20)
                .with_option("chunk_overlap", 0),
        )
    }

    const TEXT: &str = "Rust ownership keeps memory safe without a garbage collector.";

    #[tokio::test]
    async fn test_full_run_with_local_embedder() {
        let h = harness();
        let config = small_chunks(IngestionConfig::new("docs"))
            .with_embedder(ComponentSpec::new("local").with_option("dimensions", 32))
            .with_indexers(vec![
                ComponentSpec::new("vector_store"),
                ComponentSpec::new("search_index"),
            ]);

        let input = ParserInput::from_text(TEXT).with_filename("notes.txt");
        let result = h
            .pipeline
            .ingest(input, &config, &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.document_id, "notes.txt");
        assert_eq!(result.chunks_created, 4);
        assert_eq!(result.chunks_embedded, 4);
        assert_eq!(result.chunk_ids[0], "notes.txt_chunk_0");
        assert_eq!(h.vectors.count("docs").await.unwrap(), 4);
        assert_eq!(h.text.count("docs").await.unwrap(), 4);

        let stored = h.vectors.get("docs", "notes.txt_chunk_1").await.unwrap().unwrap();
        assert_eq!(stored.vector.len(), 32);
        assert_eq!(stored.metadata.get("source"), Some(&serde_json::json!("notes.txt")));
        assert_eq!(stored.metadata.get("chunk_index"), Some(&serde_json::json!(1)));

        let run_id = h.reporter.updates()[0].run_id.clone();
        assert_eq!(
            h.reporter.stages(&run_id),
            vec![
                IngestionStage::Received,
                IngestionStage::Parsed,
                IngestionStage::Chunked,
                IngestionStage::Embedded,
                IngestionStage::Indexed,
                IngestionStage::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_reingestion_is_idempotent() {
        let h = harness();
        let config = small_chunks(IngestionConfig::new("docs")).with_document_id("doc-1");
        let token = CancellationToken::new();

        for _ in 0..2 {
            h.pipeline
                .ingest(ParserInput::from_text(TEXT).with_filename("a.txt"), &config, &token)
                .await
                .unwrap();
        }

        assert_eq!(h.text.count("docs").await.unwrap(), 4);
        assert!(h.text.get("docs", "doc-1_chunk_0").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_config_errors_before_any_stage() {
        let h = harness();
        let config = IngestionConfig::new("docs").with_chunker(ComponentSpec::new("banana"));

        let err = h
            .pipeline
            .ingest(ParserInput::from_text(TEXT), &config, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            DomainError::ComponentNotFound { available, .. } => assert_eq!(
                available,
                vec!["fixed_size", "recursive", "sentence", "paragraph", "semantic"]
            ),
            other => panic!("unexpected error: {other}"),
        }
        assert!(h.reporter.updates().is_empty());
    }

    #[tokio::test]
    async fn test_parse_failure_is_reported() {
        let h = harness();
        let config = IngestionConfig::new("docs").with_parser(ComponentSpec::new("json"));

        let result = h
            .pipeline
            .ingest(
                ParserInput::from_text("{not json").with_filename("bad.json"),
                &config,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.state, IngestionStage::Failed);
        assert_eq!(result.last_stage, IngestionStage::Received);
        let failure = result.failure.unwrap();
        assert_eq!(failure.step, PipelineStep::Parse);
        assert_eq!(failure.component, "json");
        assert_eq!(h.text.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_embed_failure_stops_before_index() {
        let provider = Arc::new(
            MockEmbeddingProvider::new("mock", 8)
                .with_error(DomainError::http(Some(400), "bad input")),
        );
        let h = harness_with(Some(provider));
        let config = IngestionConfig::new("docs").with_embedder(ComponentSpec::new("remote"));

        let result = h
            .pipeline
            .ingest(
                ParserInput::from_text(TEXT).with_filename("a.txt"),
                &config,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let failure = result.failure.unwrap();
        assert_eq!(failure.step, PipelineStep::Embed);
        assert_eq!(failure.component, "remote");
        assert_eq!(result.last_stage, IngestionStage::Chunked);
        assert_eq!(h.text.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_fails_index_stage() {
        let h = harness();
        let token = CancellationToken::new();

        let first = small_chunks(IngestionConfig::new("docs"))
            .with_embedder(ComponentSpec::new("local").with_option("dimensions", 16))
            .with_indexers(vec![ComponentSpec::new("vector_store")]);
        h.pipeline
            .ingest(ParserInput::from_text(TEXT).with_filename("a.txt"), &first, &token)
            .await
            .unwrap();

        let second = small_chunks(IngestionConfig::new("docs"))
            .with_embedder(ComponentSpec::new("local").with_option("dimensions", 32))
            .with_indexers(vec![ComponentSpec::new("vector_store")]);
        let result = h
            .pipeline
            .ingest(ParserInput::from_text(TEXT).with_filename("b.txt"), &second, &token)
            .await
            .unwrap();

        let failure = result.failure.unwrap();
        assert_eq!(failure.step, PipelineStep::Index);
        assert!(failure.message.contains("expected 16"));
        assert_eq!(h.vectors.count("docs").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_cancellation_before_index() {
        let h = harness();
        let token = CancellationToken::new();
        token.cancel();

        let err = h
            .pipeline
            .ingest(
                ParserInput::from_text(TEXT).with_filename("a.txt"),
                &IngestionConfig::new("docs"),
                &token,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Cancelled { ref stage } if stage == "index"));
        assert_eq!(h.text.count("docs").await.unwrap(), 0);
        assert_eq!(
            h.reporter.updates().last().map(|u| u.stage),
            Some(IngestionStage::Failed)
        );
    }

    #[tokio::test]
    async fn test_empty_document_completes_without_writes() {
        let h = harness();

        let result = h
            .pipeline
            .ingest(
                ParserInput::from_text("   ").with_filename("a.txt"),
                &IngestionConfig::new("docs").with_embedder(ComponentSpec::new("local")),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.chunks_created, 0);
        assert!(result.chunk_ids.is_empty());
        assert_eq!(h.text.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reingesting_shorter_document_drops_old_chunks() {
        let h = harness();
        let token = CancellationToken::new();
        let config = small_chunks(IngestionConfig::new("docs"))
            .with_embedder(ComponentSpec::new("local").with_option("dimensions", 32))
            .with_indexers(vec![
                ComponentSpec::new("vector_store"),
                ComponentSpec::new("search_index"),
            ]);

        let first = h
            .pipeline
            .ingest(ParserInput::from_text(TEXT).with_filename("a.txt"), &config, &token)
            .await
            .unwrap();
        assert_eq!(first.chunks_created, 4);

        let second = h
            .pipeline
            .ingest(ParserInput::from_text("short text").with_filename("a.txt"), &config, &token)
            .await
            .unwrap();

        assert!(second.is_success());
        assert_eq!(second.chunk_ids, vec!["a.txt_chunk_0"]);
        assert_eq!(h.text.count("docs").await.unwrap(), 1);
        assert_eq!(h.vectors.count("docs").await.unwrap(), 1);
        assert!(h.text.get("docs", "a.txt_chunk_3").await.unwrap().is_none());
        assert!(h.vectors.get("docs", "a.txt_chunk_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reingesting_empty_document_clears_it() {
        let h = harness();
        let token = CancellationToken::new();
        let config = small_chunks(IngestionConfig::new("docs"));

        h.pipeline
            .ingest(ParserInput::from_text(TEXT).with_filename("a.txt"), &config, &token)
            .await
            .unwrap();
        h.pipeline
            .ingest(ParserInput::from_text("  ").with_filename("a.txt"), &config, &token)
            .await
            .unwrap();

        assert_eq!(h.text.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_rejects_duplicate_document_ids() {
        let h = harness();
        let config = small_chunks(IngestionConfig::new("docs"));

        let err = h
            .pipeline
            .ingest_batch(
                vec![
                    ParserInput::from_text(TEXT).with_filename("notes.txt"),
                    ParserInput::from_text("other notes").with_filename("notes.txt"),
                ],
                &config,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.to_string().contains("notes.txt"));
        assert_eq!(h.text.count("docs").await.unwrap(), 0);
        assert!(h.reporter.updates().is_empty());
    }

    #[tokio::test]
    async fn test_batch_rejects_fixed_document_id_for_many_inputs() {
        let h = harness();
        let config = small_chunks(IngestionConfig::new("docs")).with_document_id("doc-1");

        let err = h
            .pipeline
            .ingest_batch(
                vec![
                    ParserInput::from_text(TEXT).with_filename("a.txt"),
                    ParserInput::from_text(TEXT).with_filename("b.txt"),
                ],
                &config,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(h.text.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_and_delete() {
        let h = harness();
        let config = small_chunks(IngestionConfig::new("docs"));
        let token = CancellationToken::new();

        let batch = h
            .pipeline
            .ingest_batch(
                vec![
                    ParserInput::from_text(TEXT).with_filename("a.txt"),
                    ParserInput::from_text("{broken").with_filename("b.json"),
                ],
                &config,
                &token,
            )
            .await
            .unwrap();

        assert_eq!(batch.total_documents, 2);
        assert_eq!(batch.successful, 1);
        assert_eq!(batch.failed, 1);

        let removed = h
            .pipeline
            .delete_document(&batch.results[0], &config, &token)
            .await
            .unwrap();

        assert_eq!(removed, 4);
        assert_eq!(h.text.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reporter_sees_failure_detail() {
        let mut reporter = MockStatusReporter::new();
        reporter
            .expect_report()
            .withf(|update| {
                update.stage == IngestionStage::Failed
                    && update.detail.as_deref().is_some_and(|d| d.contains("parse failed in 'auto'"))
            })
            .times(1)
            .return_const(());
        reporter
            .expect_report()
            .withf(|update| update.stage == IngestionStage::Received)
            .times(1)
            .return_const(());

        let ctx = ComponentContext::new(Arc::new(ComponentRegistry::with_builtins().unwrap()))
            .with_text_index(Arc::new(InMemoryTextIndex::new()));
        let pipeline = IngestionPipeline::new(ctx).with_reporter(Arc::new(reporter));

        let result = pipeline
            .ingest(
                ParserInput::from_text("x").with_filename("file.unknown"),
                &IngestionConfig::new("docs"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!result.is_success());
    }
}
