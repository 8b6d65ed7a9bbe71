//! Keyed component factory

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::context::ComponentContext;
use super::descriptor::{ComponentCategory, ComponentDescriptor};
use super::schema::{ComponentConfig, ResolvedConfig};
use crate::domain::DomainError;

/// Builds a component instance from validated options
pub type Constructor<T> =
    Arc<dyn Fn(ResolvedConfig, &ComponentContext) -> Result<Arc<T>, DomainError> + Send + Sync>;

struct FactoryEntry<T: ?Sized> {
    descriptor: ComponentDescriptor,
    constructor: Constructor<T>,
}

/// Maps string keys to constructors for one component category.
///
/// Entries keep registration order; `list_available` and extension lookup
/// rely on it. Every `create` call returns a fresh instance.
pub struct ComponentFactory<T: ?Sized> {
    category: ComponentCategory,
    entries: RwLock<Vec<FactoryEntry<T>>>,
}

impl<T: ?Sized> ComponentFactory<T> {
    pub fn new(category: ComponentCategory) -> Self {
        Self {
            category,
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn category(&self) -> ComponentCategory {
        self.category
    }

    /// Register a constructor under the descriptor's key.
    ///
    /// Re-registering an existing key replaces it in place.
    pub fn register<F>(&self, descriptor: ComponentDescriptor, constructor: F) -> Result<(), DomainError>
    where
        F: Fn(ResolvedConfig, &ComponentContext) -> Result<Arc<T>, DomainError>
            + Send
            + Sync
            + 'static,
    {
        if descriptor.category != self.category {
            return Err(DomainError::configuration(format!(
                "Cannot register {} component '{}' in the {} factory",
                descriptor.category, descriptor.key, self.category
            )));
        }

        let entry = FactoryEntry {
            descriptor,
            constructor: Arc::new(constructor),
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        match entries
            .iter_mut()
            .find(|e| e.descriptor.key == entry.descriptor.key)
        {
            Some(existing) => {
                debug!(
                    category = %self.category,
                    key = %entry.descriptor.key,
                    "Replacing registered component"
                );
                *existing = entry;
            }
            None => {
                debug!(
                    category = %self.category,
                    key = %entry.descriptor.key,
                    "Registering component"
                );
                entries.push(entry);
            }
        }

        Ok(())
    }

    /// Validate `config` against the component's schema and construct it
    pub fn create(
        &self,
        key: &str,
        config: &ComponentConfig,
        ctx: &ComponentContext,
    ) -> Result<Arc<T>, DomainError> {
        let (schema, constructor) = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

            match entries.iter().find(|e| e.descriptor.key == key) {
                Some(entry) => (entry.descriptor.schema.clone(), entry.constructor.clone()),
                None => {
                    return Err(DomainError::component_not_found(
                        self.category.factory_name(),
                        key,
                        entries.iter().map(|e| e.descriptor.key.clone()).collect(),
                    ));
                }
            }
        };

        let resolved = schema.validate(&format!("{}/{}", self.category, key), config)?;

        constructor(resolved, ctx)
    }

    /// Descriptors in registration order
    pub fn list_available(&self) -> Vec<ComponentDescriptor> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.descriptor.clone())
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.descriptor.key.clone())
            .collect()
    }

    pub fn descriptor(&self, key: &str) -> Option<ComponentDescriptor> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|e| e.descriptor.key == key)
            .map(|e| e.descriptor.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.descriptor(key).is_some()
    }
}

impl<T: ?Sized> fmt::Debug for ComponentFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("category", &self.category)
            .field("keys", &self.keys())
            .finish()
    }
}
