//! Document ingestion infrastructure
//!
//! Parsers and chunkers registered under their component keys, and the
//! pipeline that drives a document from raw bytes into the indexes.

pub mod chunkers;
pub mod factory;
pub mod parsers;
pub mod pipeline;

pub use chunkers::{
    FixedSizeChunker, ParagraphChunker, RecursiveChunker, SemanticChunker, SentenceChunker,
};
pub use factory::{chunker_factory, parser_factory, register_chunkers, register_parsers};
pub use parsers::{
    AutoParser, CsvParser, DocxParser, HtmlParser, JsonParser, MarkdownParser, PdfParser,
    TextParser,
};
pub use pipeline::{chunk_id, IngestionPipeline};
