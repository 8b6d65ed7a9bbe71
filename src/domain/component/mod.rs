//! Pluggable component model
//!
//! This module provides:
//! - `ComponentDescriptor` and `ConfigSchema` describing each variant
//! - `ComponentFactory` mapping keys to constructors for one category
//! - `ComponentRegistry` mapping category names to factories
//! - `ComponentContext` carrying shared collaborators into constructors
//! - `ComponentSpec` selecting a component by key in pipeline configuration

mod context;
mod descriptor;
mod factory;
mod registry;
mod schema;
mod spec;

pub use context::ComponentContext;
pub use descriptor::{ComponentCategory, ComponentDescriptor};
pub use factory::{ComponentFactory, Constructor};
pub use registry::{ComponentRegistry, FactoryCatalog};
pub use schema::{ComponentConfig, ConfigField, ConfigSchema, FieldKind, ResolvedConfig};
pub use spec::ComponentSpec;
