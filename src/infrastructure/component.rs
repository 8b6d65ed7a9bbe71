//! Built-in component bootstrap

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use super::embedding::register_embedders;
use super::index::register_indexers;
use super::ingestion::{register_chunkers, register_parsers};
use super::retrieval::{register_optimizers, register_searchers};
use crate::domain::component::ComponentRegistry;
use crate::domain::DomainError;

static GLOBAL_REGISTRY: OnceCell<Arc<ComponentRegistry>> = OnceCell::new();

type Registration = fn(&ComponentRegistry) -> Result<(), DomainError>;

/// Register every built-in factory, in category order
pub fn register_builtin_components(registry: &ComponentRegistry) -> Result<(), DomainError> {
    let registrations: [(&str, Registration); 6] = [
        ("parsers", register_parsers),
        ("chunkers", register_chunkers),
        ("embedders", register_embedders),
        ("indexers", register_indexers),
        ("searchers", register_searchers),
        ("optimizers", register_optimizers),
    ];

    for (category, register) in registrations {
        debug!(category, "Registering built-in components");
        register(registry)?;
    }

    info!(
        components = registry.list_available().len(),
        "Built-in components registered"
    );

    Ok(())
}

impl ComponentRegistry {
    /// A fresh registry holding every built-in factory
    pub fn with_builtins() -> Result<Self, DomainError> {
        let registry = Self::new();
        register_builtin_components(&registry)?;
        Ok(registry)
    }
}

/// Build the process-wide registry. Later calls return the same instance.
pub fn init_global_registry() -> Result<Arc<ComponentRegistry>, DomainError> {
    GLOBAL_REGISTRY
        .get_or_try_init(|| ComponentRegistry::with_builtins().map(Arc::new))
        .cloned()
}

/// The process-wide registry; `init_global_registry` must have run
pub fn global_registry() -> Result<Arc<ComponentRegistry>, DomainError> {
    GLOBAL_REGISTRY.get().cloned().ok_or_else(|| {
        DomainError::configuration("Component registry is not initialized")
    })
}
