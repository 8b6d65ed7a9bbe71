//! Indexer registrations

use std::sync::Arc;

use super::indexers::{SearchIndexIndexer, VectorStoreIndexer};
use crate::domain::component::{
    ComponentCategory, ComponentDescriptor, ComponentFactory, ComponentRegistry, ConfigField,
    ConfigSchema,
};
use crate::domain::index::Indexer;
use crate::domain::DomainError;

pub const VECTOR_STORE_INDEXER_KEY: &str = "vector_store";
pub const SEARCH_INDEX_INDEXER_KEY: &str = "search_index";

/// Build the indexer factory with the built-in variants
pub fn indexer_factory() -> Result<ComponentFactory<dyn Indexer>, DomainError> {
    let factory: ComponentFactory<dyn Indexer> = ComponentFactory::new(ComponentCategory::Indexer);

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Indexer, VECTOR_STORE_INDEXER_KEY, "Vector Store")
            .with_description("Upserts embedded chunks into the context's vector store")
            .with_schema(
                ConfigSchema::new().field(
                    ConfigField::integer("dimensions")
                        .with_min(1.0)
                        .describe("Collection dimensionality; defaults to the first vector's length"),
                ),
            ),
        |config, ctx| {
            let mut indexer = VectorStoreIndexer::new(ctx.vector_store()?);
            if let Some(dimensions) = config.get_usize("dimensions") {
                indexer = indexer.with_dimensions(dimensions);
            }
            Ok(Arc::new(indexer) as Arc<dyn Indexer>)
        },
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Indexer, SEARCH_INDEX_INDEXER_KEY, "Search Index")
            .with_description("Upserts chunk text into the context's full-text index"),
        |_config, ctx| Ok(Arc::new(SearchIndexIndexer::new(ctx.text_index()?)) as Arc<dyn Indexer>),
    )?;

    Ok(factory)
}

pub fn register_indexers(registry: &ComponentRegistry) -> Result<(), DomainError> {
    registry.register_factory(
        ComponentCategory::Indexer.factory_name(),
        Arc::new(indexer_factory()?),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::{ComponentConfig, ComponentContext};
    use crate::infrastructure::index::{InMemoryTextIndex, InMemoryVectorStore};

    #[test]
    fn test_keys() {
        assert_eq!(indexer_factory().unwrap().keys(), vec!["vector_store", "search_index"]);
    }

    #[test]
    fn test_vector_store_needs_backend() {
        let factory = indexer_factory().unwrap();

        let err = factory
            .create("vector_store", &ComponentConfig::new(), &ComponentContext::empty())
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));

        let ctx = ComponentContext::empty()
            .with_vector_store(Arc::new(InMemoryVectorStore::new()))
            .with_text_index(Arc::new(InMemoryTextIndex::new()));
        let config = ComponentConfig::new().with("dimensions", 8);

        assert_eq!(factory.create("vector_store", &config, &ctx).unwrap().name(), "vector_store");
        assert_eq!(
            factory.create("search_index", &ComponentConfig::new(), &ctx).unwrap().name(),
            "search_index"
        );
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let ctx = ComponentContext::empty().with_vector_store(Arc::new(InMemoryVectorStore::new()));
        let config = ComponentConfig::new().with("dimensions", 0);

        assert!(matches!(
            indexer_factory().unwrap().create("vector_store", &config, &ctx),
            Err(DomainError::Validation { .. })
        ));
    }
}
