//! Index backends and indexers
//!
//! In-memory `VectorStore` and `TextIndex` implementations plus the
//! `vector_store` and `search_index` indexer components writing to them.

mod factory;
mod indexers;
mod memory_text;
mod memory_vector;

pub use factory::{
    indexer_factory, register_indexers, SEARCH_INDEX_INDEXER_KEY, VECTOR_STORE_INDEXER_KEY,
};
pub use indexers::{SearchIndexIndexer, VectorStoreIndexer};
pub use memory_text::{tokenize, InMemoryTextIndex};
pub use memory_vector::InMemoryVectorStore;
