//! Embedder registrations

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use super::http_client::HttpClient;
use super::local::{HashingModel, LocalEmbedder, DEFAULT_LOCAL_MODEL, LOCAL_MODELS};
use super::openai::{OpenAiEmbeddingProvider, DEFAULT_OPENAI_BASE_URL};
use super::remote::{RemoteEmbedder, RetryPolicy};
use crate::domain::component::{
    ComponentCategory, ComponentContext, ComponentDescriptor, ComponentFactory, ComponentRegistry,
    ConfigField, ConfigSchema,
};
use crate::domain::embedding::{Embedder, EmbeddingProvider};
use crate::domain::DomainError;

pub const REMOTE_EMBEDDER_KEY: &str = "remote";
pub const LOCAL_EMBEDDER_KEY: &str = "local";

const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Deserialize)]
struct RemoteEmbedderConfig {
    base_url: String,
    api_key_env: String,
    model: Option<String>,
    dimensions: Option<usize>,
    batch_size: usize,
    timeout_ms: u64,
    #[serde(flatten)]
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct LocalEmbedderConfig {
    model: String,
    dimensions: Option<usize>,
    model_path: Option<String>,
}

fn remote_schema() -> ConfigSchema {
    ConfigSchema::new()
        .field(
            ConfigField::string("provider")
                .with_default("openai")
                .one_of(&["openai"])
                .describe("Wire protocol of the embedding API"),
        )
        .field(ConfigField::string("base_url").with_default(DEFAULT_OPENAI_BASE_URL))
        .field(
            ConfigField::string("api_key_env")
                .with_default(DEFAULT_API_KEY_ENV)
                .describe("Environment variable holding the API key"),
        )
        .field(ConfigField::string("model").describe("Defaults to the provider's default model"))
        .field(ConfigField::integer("dimensions").with_min(1.0))
        .field(ConfigField::integer("batch_size").with_default(100).with_min(1.0))
        .field(ConfigField::integer("max_retries").with_default(3).with_range(0.0, 10.0))
        .field(ConfigField::integer("min_delay_ms").with_default(200).with_min(0.0))
        .field(ConfigField::integer("max_delay_ms").with_default(5000).with_min(0.0))
        .field(ConfigField::integer("timeout_ms").with_default(30_000).with_min(1.0))
}

fn local_schema() -> ConfigSchema {
    let known: Vec<&str> = LOCAL_MODELS.iter().map(|(name, _)| *name).collect();

    ConfigSchema::new()
        .field(
            ConfigField::string("model")
                .with_default(DEFAULT_LOCAL_MODEL)
                .describe(format!("One of: {}", known.join(", "))),
        )
        .field(ConfigField::integer("dimensions").with_min(1.0))
        .field(ConfigField::string("model_path").describe("Stop-word file; must exist"))
}

fn provider_for(
    config: &RemoteEmbedderConfig,
    ctx: &ComponentContext,
) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
    if let Some(provider) = ctx.embedding_provider() {
        return Ok(provider);
    }

    let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
    if api_key.is_empty() {
        warn!(
            env = %config.api_key_env,
            base_url = %config.base_url,
            "No API key found, sending unauthenticated embedding requests"
        );
    }

    let client = HttpClient::with_timeout(Duration::from_millis(config.timeout_ms))?;

    Ok(Arc::new(OpenAiEmbeddingProvider::with_base_url(
        client,
        api_key,
        config.base_url.clone(),
    )))
}

/// Build the embedder factory with the built-in variants
pub fn embedder_factory() -> Result<ComponentFactory<dyn Embedder>, DomainError> {
    let factory: ComponentFactory<dyn Embedder> = ComponentFactory::new(ComponentCategory::Embedder);

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Embedder, REMOTE_EMBEDDER_KEY, "Remote")
            .with_description("OpenAI-compatible embeddings API with batching and retries")
            .with_schema(remote_schema()),
        |config, ctx| {
            let config: RemoteEmbedderConfig = config.deserialize()?;
            let provider = provider_for(&config, ctx)?;

            let mut embedder = RemoteEmbedder::new(provider)
                .with_batch_size(config.batch_size)
                .with_retry(config.retry)
                .with_timeout(Duration::from_millis(config.timeout_ms));

            if let Some(model) = config.model {
                embedder = embedder.with_model(model);
            }
            if let Some(dimensions) = config.dimensions {
                embedder = embedder.with_dimensions(dimensions);
            }

            Ok(Arc::new(embedder) as Arc<dyn Embedder>)
        },
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Embedder, LOCAL_EMBEDDER_KEY, "Local")
            .with_description("Deterministic in-process hashing model")
            .with_schema(local_schema()),
        |config, _ctx| {
            let config: LocalEmbedderConfig = config.deserialize()?;
            let model =
                HashingModel::load(&config.model, config.dimensions, config.model_path.as_deref())?;

            Ok(Arc::new(LocalEmbedder::new(model)) as Arc<dyn Embedder>)
        },
    )?;

    Ok(factory)
}

pub fn register_embedders(registry: &ComponentRegistry) -> Result<(), DomainError> {
    registry.register_factory(
        ComponentCategory::Embedder.factory_name(),
        Arc::new(embedder_factory()?),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::ComponentConfig;
    use crate::domain::embedding::MockEmbeddingProvider;

    #[test]
    fn test_local_defaults() {
        let embedder = embedder_factory()
            .unwrap()
            .create("local", &ComponentConfig::new(), &ComponentContext::empty())
            .unwrap();

        assert_eq!(embedder.model(), DEFAULT_LOCAL_MODEL);
        assert_eq!(embedder.dimensions(), Some(384));
    }

    #[test]
    fn test_local_unknown_model() {
        let config = ComponentConfig::new().with("model", "no-such-model");
        let err = embedder_factory()
            .unwrap()
            .create("local", &config, &ComponentContext::empty())
            .unwrap_err();

        assert!(matches!(err, DomainError::ModelLoad { .. }));
    }

    #[tokio::test]
    async fn test_remote_uses_context_provider() {
        let provider = Arc::new(MockEmbeddingProvider::new("mock", 6));
        let ctx = ComponentContext::empty().with_embedding_provider(provider.clone());
        let config = ComponentConfig::new().with("batch_size", 1).with("model", "m");

        let embedder = embedder_factory().unwrap().create("remote", &config, &ctx).unwrap();
        let vectors = embedder
            .embed(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(embedder.model(), "m");
        assert_eq!(vectors.len(), 2);
        assert_eq!(provider.batch_sizes(), vec![1, 1]);
    }

    #[test]
    fn test_remote_builds_openai_provider() {
        let config = ComponentConfig::new()
            .with("base_url", "http://localhost:9999")
            .with("api_key_env", "PMP_RAG_TEST_UNSET_KEY");

        let embedder = embedder_factory()
            .unwrap()
            .create("remote", &config, &ComponentContext::empty())
            .unwrap();

        assert_eq!(embedder.model(), "text-embedding-3-small");
        assert_eq!(embedder.dimensions(), Some(1536));
    }

    #[test]
    fn test_remote_rejects_unknown_provider() {
        let config = ComponentConfig::new().with("provider", "carrier-pigeon");

        assert!(matches!(
            embedder_factory()
                .unwrap()
                .create("remote", &config, &ComponentContext::empty()),
            Err(DomainError::Validation { .. })
        ));
    }
}
