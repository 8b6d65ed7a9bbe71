//! Searcher and optimizer registrations

use std::sync::Arc;

use serde::Deserialize;

use super::optimizers::{
    DedupKey, DedupOptimizer, MaxResultsOptimizer, RerankOptimizer, ScoreThresholdOptimizer,
    DEDUP_ORDER, MAX_RESULTS_ORDER, RERANK_ORDER, SCORE_THRESHOLD_ORDER,
};
use super::searchers::{FullTextSearcher, HybridSearcher, SemanticSearcher, DEFAULT_HYBRID_CANDIDATES};
use crate::domain::component::{
    ComponentCategory, ComponentConfig, ComponentContext, ComponentDescriptor, ComponentFactory,
    ComponentRegistry, ConfigField, ConfigSchema, ResolvedConfig,
};
use crate::domain::embedding::Embedder;
use crate::domain::retrieval::{ResultOptimizer, Searcher};
use crate::domain::DomainError;
use crate::infrastructure::embedding::LOCAL_EMBEDDER_KEY;

#[derive(Debug, Deserialize)]
struct SemanticSearcherConfig {
    embedder: String,
    #[serde(default)]
    embedder_config: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct HybridSearcherConfig {
    #[serde(flatten)]
    semantic: SemanticSearcherConfig,
    candidates: usize,
    semantic_weight: f32,
    text_weight: f32,
}

fn embedder_fields(schema: ConfigSchema) -> ConfigSchema {
    schema
        .field(
            ConfigField::string("embedder")
                .with_default(LOCAL_EMBEDDER_KEY)
                .describe("Query embedder key; must match the one used at ingestion"),
        )
        .field(ConfigField::object("embedder_config").with_default(serde_json::json!({})))
}

fn query_embedder(
    config: &SemanticSearcherConfig,
    ctx: &ComponentContext,
) -> Result<Arc<dyn Embedder>, DomainError> {
    let options = ComponentConfig::from_value(config.embedder_config.clone())?;
    ctx.registry().embedders()?.create(&config.embedder, &options, ctx)
}

fn order_field(default: i32) -> ConfigField {
    ConfigField::integer("order")
        .with_default(default)
        .with_range(i32::MIN as f64, i32::MAX as f64)
        .describe("Execution order in the chain, lower runs first")
}

fn order_of(config: &ResolvedConfig, default: i32) -> i32 {
    config
        .get("order")
        .and_then(serde_json::Value::as_i64)
        .and_then(|o| i32::try_from(o).ok())
        .unwrap_or(default)
}

/// Build the searcher factory with the built-in variants
pub fn searcher_factory() -> Result<ComponentFactory<dyn Searcher>, DomainError> {
    let factory: ComponentFactory<dyn Searcher> = ComponentFactory::new(ComponentCategory::Searcher);

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Searcher, "semantic", "Semantic")
            .with_description("Cosine similarity over the vector store")
            .with_schema(embedder_fields(ConfigSchema::new())),
        |config, ctx| {
            let config: SemanticSearcherConfig = config.deserialize()?;
            let embedder = query_embedder(&config, ctx)?;

            Ok(Arc::new(SemanticSearcher::new(embedder, ctx.vector_store()?)) as Arc<dyn Searcher>)
        },
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Searcher, "full_text", "Full Text")
            .with_description("BM25 over the text index"),
        |_config, ctx| Ok(Arc::new(FullTextSearcher::new(ctx.text_index()?)) as Arc<dyn Searcher>),
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Searcher, "hybrid", "Hybrid")
            .with_description("Weighted union of semantic and full-text results")
            .with_schema(
                embedder_fields(ConfigSchema::new())
                    .field(
                        ConfigField::integer("candidates")
                            .with_default(DEFAULT_HYBRID_CANDIDATES)
                            .with_min(1.0),
                    )
                    .field(ConfigField::float("semantic_weight").with_default(0.5).with_min(0.0))
                    .field(ConfigField::float("text_weight").with_default(0.5).with_min(0.0)),
            ),
        |config, ctx| {
            let config: HybridSearcherConfig = config.deserialize()?;
            let embedder = query_embedder(&config.semantic, ctx)?;

            let semantic = Arc::new(SemanticSearcher::new(embedder, ctx.vector_store()?));
            let text = Arc::new(FullTextSearcher::new(ctx.text_index()?));

            let hybrid = HybridSearcher::new(semantic, text)
                .with_candidates(config.candidates)
                .with_weights(config.semantic_weight, config.text_weight)?;

            Ok(Arc::new(hybrid) as Arc<dyn Searcher>)
        },
    )?;

    Ok(factory)
}

/// Build the optimizer factory with the built-in variants
pub fn optimizer_factory() -> Result<ComponentFactory<dyn ResultOptimizer>, DomainError> {
    let factory: ComponentFactory<dyn ResultOptimizer> =
        ComponentFactory::new(ComponentCategory::Optimizer);

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Optimizer, "score_threshold", "Score Threshold")
            .with_description("Drops results scoring below the threshold")
            .with_schema(
                ConfigSchema::new()
                    .field(ConfigField::float("threshold").with_default(0.5).with_range(0.0, 1.0))
                    .field(order_field(SCORE_THRESHOLD_ORDER)),
            ),
        |config, _ctx| {
            let threshold = config.get_f64("threshold").unwrap_or(0.5) as f32;
            Ok(Arc::new(
                ScoreThresholdOptimizer::new(threshold)
                    .with_order(order_of(&config, SCORE_THRESHOLD_ORDER)),
            ) as Arc<dyn ResultOptimizer>)
        },
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Optimizer, "dedup", "Deduplicate")
            .with_description("Keeps the first result per key")
            .with_schema(
                ConfigSchema::new()
                    .field(
                        ConfigField::string("key")
                            .with_default("normalized_content")
                            .one_of(&["id", "content", "normalized_content"]),
                    )
                    .field(order_field(DEDUP_ORDER)),
            ),
        |config, _ctx| {
            let key: DedupKey = serde_json::from_value(
                config
                    .get("key")
                    .cloned()
                    .unwrap_or_else(|| serde_json::json!("normalized_content")),
            )
            .map_err(|e| DomainError::configuration(format!("Invalid dedup key: {}", e)))?;

            Ok(Arc::new(DedupOptimizer::new(key).with_order(order_of(&config, DEDUP_ORDER)))
                as Arc<dyn ResultOptimizer>)
        },
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Optimizer, "rerank", "Rerank")
            .with_description("Blends scores with query-term overlap and re-sorts")
            .with_schema(
                ConfigSchema::new()
                    .field(ConfigField::float("weight").with_default(0.5).with_range(0.0, 1.0))
                    .field(order_field(RERANK_ORDER)),
            ),
        |config, _ctx| {
            let weight = config.get_f64("weight").unwrap_or(0.5) as f32;
            Ok(Arc::new(RerankOptimizer::new(weight).with_order(order_of(&config, RERANK_ORDER)))
                as Arc<dyn ResultOptimizer>)
        },
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Optimizer, "max_results", "Max Results")
            .with_description("Keeps the first N results")
            .with_schema(
                ConfigSchema::new()
                    .field(ConfigField::integer("limit").with_default(10).with_min(1.0))
                    .field(order_field(MAX_RESULTS_ORDER)),
            ),
        |config, _ctx| {
            let limit = config.get_usize("limit").unwrap_or(10);
            Ok(Arc::new(
                MaxResultsOptimizer::new(limit).with_order(order_of(&config, MAX_RESULTS_ORDER)),
            ) as Arc<dyn ResultOptimizer>)
        },
    )?;

    Ok(factory)
}

pub fn register_searchers(registry: &ComponentRegistry) -> Result<(), DomainError> {
    registry.register_factory(
        ComponentCategory::Searcher.factory_name(),
        Arc::new(searcher_factory()?),
    );
    Ok(())
}

pub fn register_optimizers(registry: &ComponentRegistry) -> Result<(), DomainError> {
    registry.register_factory(
        ComponentCategory::Optimizer.factory_name(),
        Arc::new(optimizer_factory()?),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::index::{InMemoryTextIndex, InMemoryVectorStore};

    fn ctx() -> ComponentContext {
        ComponentContext::new(Arc::new(ComponentRegistry::with_builtins().unwrap()))
            .with_vector_store(Arc::new(InMemoryVectorStore::new()))
            .with_text_index(Arc::new(InMemoryTextIndex::new()))
    }

    #[test]
    fn test_searcher_keys() {
        assert_eq!(
            searcher_factory().unwrap().keys(),
            vec!["semantic", "full_text", "hybrid"]
        );
    }

    #[test]
    fn test_optimizer_keys() {
        assert_eq!(
            optimizer_factory().unwrap().keys(),
            vec!["score_threshold", "dedup", "rerank", "max_results"]
        );
    }

    #[test]
    fn test_create_every_searcher() {
        let ctx = ctx();
        let factory = searcher_factory().unwrap();

        for key in ["semantic", "full_text", "hybrid"] {
            let searcher = factory.create(key, &ComponentConfig::new(), &ctx).unwrap();
            assert_eq!(searcher.name(), key);
        }
    }

    #[test]
    fn test_semantic_embedder_config_is_validated() {
        let config = ComponentConfig::new()
            .with("embedder", "local")
            .with("embedder_config", serde_json::json!({"model": "nope"}));

        let err = searcher_factory()
            .unwrap()
            .create("semantic", &config, &ctx())
            .unwrap_err();

        assert!(matches!(err, DomainError::ModelLoad { .. }));
    }

    #[test]
    fn test_hybrid_weight_validation() {
        let config = ComponentConfig::new()
            .with("semantic_weight", 0.0)
            .with("text_weight", 0.0);

        assert!(searcher_factory().unwrap().create("hybrid", &config, &ctx()).is_err());
    }

    #[test]
    fn test_optimizer_defaults_and_overrides() {
        let factory = optimizer_factory().unwrap();
        let ctx = ComponentContext::empty();

        let dedup = factory.create("dedup", &ComponentConfig::new(), &ctx).unwrap();
        assert_eq!(dedup.order(), 50);

        let limited = factory
            .create("max_results", &ComponentConfig::new().with("order", -3), &ctx)
            .unwrap();
        assert_eq!(limited.order(), -3);

        assert!(factory
            .create("dedup", &ComponentConfig::new().with("key", "title"), &ctx)
            .is_err());
        assert!(factory
            .create("score_threshold", &ComponentConfig::new().with("threshold", 1.5), &ctx)
            .is_err());
    }

    #[test]
    fn test_order_outside_i32_is_rejected() {
        let factory = optimizer_factory().unwrap();
        let ctx = ComponentContext::empty();

        let err = factory
            .create("dedup", &ComponentConfig::new().with("order", 4_294_967_301i64), &ctx)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.to_string().contains("'order'"));

        let lowest = factory
            .create("dedup", &ComponentConfig::new().with("order", i32::MIN as i64), &ctx)
            .unwrap();
        assert_eq!(lowest.order(), i32::MIN);
    }
}
