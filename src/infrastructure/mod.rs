//! Infrastructure layer - Built-in component implementations

pub mod component;
pub mod embedding;
pub mod guard;
pub mod index;
pub mod ingestion;
pub mod logging;
pub mod retrieval;
pub mod status;

pub use component::{global_registry, init_global_registry, register_builtin_components};
pub use status::{InMemoryStatusReporter, TracingStatusReporter};
