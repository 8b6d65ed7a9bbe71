//! Category-level component registry

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::descriptor::{ComponentCategory, ComponentDescriptor};
use super::factory::ComponentFactory;
use crate::domain::embedding::Embedder;
use crate::domain::index::Indexer;
use crate::domain::ingestion::{ChunkingStrategy, DocumentParser};
use crate::domain::retrieval::{ResultOptimizer, Searcher};
use crate::domain::DomainError;

/// Type-erased view of a factory used for discovery
pub trait FactoryCatalog: Send + Sync {
    fn category(&self) -> ComponentCategory;

    fn descriptors(&self) -> Vec<ComponentDescriptor>;
}

impl<T: ?Sized + 'static> FactoryCatalog for ComponentFactory<T> {
    fn category(&self) -> ComponentCategory {
        ComponentFactory::category(self)
    }

    fn descriptors(&self) -> Vec<ComponentDescriptor> {
        self.list_available()
    }
}

struct RegisteredFactory {
    name: String,
    factory: Arc<dyn Any + Send + Sync>,
    catalog: Arc<dyn FactoryCatalog>,
}

/// Maps category names (`"parsers"`, `"chunkers"`, ...) to their factories
pub struct ComponentRegistry {
    factories: RwLock<Vec<RegisteredFactory>>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(Vec::new()),
        }
    }

    /// Register a factory under a category name. Last write wins.
    pub fn register_factory<T>(&self, name: impl Into<String>, factory: Arc<ComponentFactory<T>>)
    where
        T: ?Sized + 'static,
    {
        let name = name.into();
        let entry = RegisteredFactory {
            name: name.clone(),
            factory: factory.clone(),
            catalog: factory,
        };

        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);

        match factories.iter_mut().find(|f| f.name == name) {
            Some(existing) => {
                debug!(category = %name, "Replacing registered factory");
                *existing = entry;
            }
            None => {
                debug!(category = %name, "Registering factory");
                factories.push(entry);
            }
        }
    }

    /// Typed lookup of a factory by category name
    pub fn factory<T>(&self, name: &str) -> Result<Arc<ComponentFactory<T>>, DomainError>
    where
        T: ?Sized + 'static,
    {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);

        let entry = factories.iter().find(|f| f.name == name).ok_or_else(|| {
            DomainError::component_not_found(
                "factory",
                name,
                factories.iter().map(|f| f.name.clone()).collect(),
            )
        })?;

        entry
            .factory
            .clone()
            .downcast::<ComponentFactory<T>>()
            .map_err(|_| {
                DomainError::internal(format!(
                    "Factory '{}' does not produce the requested component type",
                    name
                ))
            })
    }

    pub fn parsers(&self) -> Result<Arc<ComponentFactory<dyn DocumentParser>>, DomainError> {
        self.factory(ComponentCategory::Parser.factory_name())
    }

    pub fn chunkers(&self) -> Result<Arc<ComponentFactory<dyn ChunkingStrategy>>, DomainError> {
        self.factory(ComponentCategory::Chunker.factory_name())
    }

    pub fn embedders(&self) -> Result<Arc<ComponentFactory<dyn Embedder>>, DomainError> {
        self.factory(ComponentCategory::Embedder.factory_name())
    }

    pub fn indexers(&self) -> Result<Arc<ComponentFactory<dyn Indexer>>, DomainError> {
        self.factory(ComponentCategory::Indexer.factory_name())
    }

    pub fn searchers(&self) -> Result<Arc<ComponentFactory<dyn Searcher>>, DomainError> {
        self.factory(ComponentCategory::Searcher.factory_name())
    }

    pub fn optimizers(&self) -> Result<Arc<ComponentFactory<dyn ResultOptimizer>>, DomainError> {
        self.factory(ComponentCategory::Optimizer.factory_name())
    }

    /// Registered category names in registration order
    pub fn list_categories(&self) -> Vec<String> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    /// Descriptors of every registered component across all categories
    pub fn list_available(&self) -> Vec<ComponentDescriptor> {
        let catalogs: Vec<Arc<dyn FactoryCatalog>> = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|f| f.catalog.clone())
            .collect();

        catalogs.iter().flat_map(|c| c.descriptors()).collect()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("categories", &self.list_categories())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::{ComponentConfig, ComponentContext};
    use crate::domain::ingestion::MockChunkingStrategy;

    fn chunker_factory(keys: &[&str]) -> Arc<ComponentFactory<dyn ChunkingStrategy>> {
        let factory = Arc::new(ComponentFactory::new(ComponentCategory::Chunker));

        for key in keys {
            factory
                .register(
                    ComponentDescriptor::new(ComponentCategory::Chunker, *key, *key),
                    |_config, _ctx| Ok(Arc::new(MockChunkingStrategy::new()) as Arc<dyn ChunkingStrategy>),
                )
                .unwrap();
        }

        factory
    }

    #[test]
    fn test_typed_lookup() {
        let registry = ComponentRegistry::new();
        registry.register_factory("chunkers", chunker_factory(&["a"]));

        let factory = registry.chunkers().unwrap();
        assert_eq!(factory.keys(), vec!["a"]);
    }

    #[test]
    fn test_unknown_category() {
        let registry = ComponentRegistry::new();
        registry.register_factory("chunkers", chunker_factory(&["a"]));

        let err = registry.parsers().unwrap_err();
        assert!(matches!(err, DomainError::ComponentNotFound { .. }));
        assert!(err.to_string().contains("chunkers"));
    }

    #[test]
    fn test_wrong_type_lookup() {
        let registry = ComponentRegistry::new();
        registry.register_factory("parsers", chunker_factory(&["a"]));

        assert!(matches!(
            registry.parsers(),
            Err(DomainError::Internal { .. })
        ));
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = ComponentRegistry::new();
        registry.register_factory("chunkers", chunker_factory(&["a"]));
        registry.register_factory("chunkers", chunker_factory(&["b", "c"]));

        assert_eq!(registry.list_categories(), vec!["chunkers"]);
        assert_eq!(registry.chunkers().unwrap().keys(), vec!["b", "c"]);
    }

    #[test]
    fn test_list_available_spans_categories() {
        let registry = Arc::new(ComponentRegistry::new());
        registry.register_factory("chunkers", chunker_factory(&["a", "b"]));

        let keys: Vec<String> = registry.list_available().into_iter().map(|d| d.key).collect();
        assert_eq!(keys, vec!["a", "b"]);

        let ctx = ComponentContext::new(registry.clone());
        let chunker = registry
            .chunkers()
            .unwrap()
            .create("b", &ComponentConfig::new(), &ctx);
        assert!(chunker.is_ok());
    }
}
