//! Indexing domain: indexer component and backend capabilities

mod indexer;
mod store;

pub use indexer::{IndexItem, IndexedDocument, Indexer};
pub use store::{ScoredRecord, TextIndex, TextRecord, VectorRecord, VectorStore};
