//! Domain layer - Component contracts, pipeline types and errors

pub mod component;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingestion;
pub mod retrieval;

pub use error::DomainError;
