//! Document parser implementations

mod auto;
mod csv;
mod docx;
pub mod encoding;
mod html;
mod json;
mod markdown;
mod pdf;
mod text;

use unicode_segmentation::UnicodeSegmentation;

use crate::domain::ingestion::DocumentMetadata;

pub use self::auto::{AutoParser, AUTO_PARSER_KEY};
pub use self::csv::CsvParser;
pub use self::docx::DocxParser;
pub use self::html::HtmlParser;
pub use self::json::JsonParser;
pub use self::markdown::MarkdownParser;
pub use self::pdf::PdfParser;
pub use self::text::TextParser;

/// Add `char_count`, `word_count` and `line_count` for the extracted text
pub(crate) fn with_counts(metadata: DocumentMetadata, text: &str) -> DocumentMetadata {
    metadata
        .with_custom("char_count", serde_json::json!(text.chars().count()))
        .with_custom("word_count", serde_json::json!(text.unicode_words().count()))
        .with_custom("line_count", serde_json::json!(text.lines().count()))
}
