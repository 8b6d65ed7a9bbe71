//! Chunking strategy implementations

mod fixed_size;
mod paragraph;
mod recursive;
mod semantic;
mod sentence;
mod spans;

pub use fixed_size::{FixedSizeChunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use paragraph::ParagraphChunker;
pub use recursive::RecursiveChunker;
pub use semantic::{SemanticChunker, DEFAULT_SIMILARITY_THRESHOLD};
pub use sentence::SentenceChunker;
