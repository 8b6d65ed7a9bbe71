//! Query command - ingests files into fresh backends, then retrieves

use clap::Args;

use crate::config::AppConfig;
use crate::domain::component::ComponentSpec;
use crate::domain::retrieval::RetrievalRequest;
use crate::infrastructure::ingestion::IngestionPipeline;
use crate::infrastructure::retrieval::RetrievalPipeline;

use super::ingest::IngestArgs;
use super::workspace::{cancel_on_interrupt, context, embedder_spec, print_json};

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub ingest: IngestArgs,

    /// Query text
    #[arg(long, short)]
    pub query: String,

    /// Searcher key; `semantic` and `hybrid` need --embedder
    #[arg(long)]
    pub searcher: Option<String>,

    /// Number of candidates to retrieve (defaults to pipeline.default_top_k)
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Drop results scoring below this value
    #[arg(long)]
    pub min_score: Option<f64>,

    /// Drop results with duplicate content
    #[arg(long)]
    pub dedup: bool,

    /// Re-score results by query-term overlap
    #[arg(long)]
    pub rerank: bool,
}

impl QueryArgs {
    fn searcher_spec(&self, config: &AppConfig) -> ComponentSpec {
        let default_key = match &self.ingest.embedder {
            Some(_) => "hybrid",
            None => "full_text",
        };
        let key = self.searcher.as_deref().unwrap_or(default_key);

        let mut spec = ComponentSpec::new(key);
        if key != "full_text" {
            if let Some(embedder) = &self.ingest.embedder {
                let embedder = embedder_spec(embedder, config);
                spec = spec
                    .with_option("embedder", embedder.key)
                    .with_option(
                        "embedder_config",
                        serde_json::to_value(embedder.config).unwrap_or_default(),
                    );
            }
        }

        spec
    }

    fn request(&self, config: &AppConfig) -> RetrievalRequest {
        let mut request = RetrievalRequest::new(&self.query, self.ingest.collection(config))
            .with_top_k(self.top_k.unwrap_or(config.pipeline.default_top_k))
            .with_searcher(self.searcher_spec(config));

        if let Some(threshold) = self.min_score {
            request = request.with_optimizer(
                ComponentSpec::new("score_threshold").with_option("threshold", threshold),
            );
        }
        if self.dedup {
            request = request.with_optimizer(ComponentSpec::new("dedup"));
        }
        if self.rerank {
            request = request.with_optimizer(ComponentSpec::new("rerank"));
        }

        request
    }
}

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let ctx = context()?;
    let cancel = cancel_on_interrupt();

    let mut ingestion = IngestionPipeline::new(ctx.clone());
    let mut retrieval = RetrievalPipeline::new(ctx);
    if let Some(timeout) = config.pipeline.call_timeout() {
        ingestion = ingestion.with_call_timeout(timeout);
        retrieval = retrieval.with_call_timeout(timeout);
    }

    let batch = args.ingest.ingest(&ingestion, &config, &cancel).await?;
    if !batch.is_success() {
        print_json(&batch)?;
        anyhow::bail!("{} document(s) failed to ingest", batch.failed);
    }

    let response = retrieval.retrieve(&args.request(&config), &cancel).await?;
    print_json(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: QueryArgs,
    }

    fn parse(argv: &[&str]) -> QueryArgs {
        Harness::parse_from(std::iter::once("query").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_full_text_without_embedder() {
        let args = parse(&["notes.md", "--query", "rust", "--dedup"]);
        let request = args.request(&AppConfig::default());

        assert_eq!(request.searcher.key, "full_text");
        assert_eq!(request.collection, "documents");
        assert_eq!(request.top_k, 5);
        assert_eq!(request.optimizers.len(), 1);
    }

    #[test]
    fn test_embedder_selects_hybrid() {
        let args = parse(&["a.txt", "-q", "rust", "--embedder", "local", "--min-score", "0.2"]);
        let request = args.request(&AppConfig::default());

        assert_eq!(request.searcher.key, "hybrid");
        assert_eq!(
            request.searcher.config.get("embedder"),
            Some(&serde_json::json!("local"))
        );
        assert_eq!(request.optimizers[0].key, "score_threshold");
    }

    #[test]
    fn test_ingestion_config_from_args() {
        let args = parse(&["a.txt", "-q", "x", "--embedder", "local", "--chunk-size", "200"]);
        let ingestion = args.ingest.ingestion_config(&AppConfig::default());

        let indexers: Vec<&str> = ingestion.indexers.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(indexers, vec!["search_index", "vector_store"]);
        assert_eq!(
            ingestion.chunker.config.get("chunk_size"),
            Some(&serde_json::json!(200))
        );
    }
}
