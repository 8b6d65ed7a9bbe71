//! PDF document parser

use async_trait::async_trait;
use lopdf::{Document, Object};
use tracing::{debug, warn};

use super::encoding::decode_bytes;
use super::with_counts;
use crate::domain::ingestion::{DocumentMetadata, DocumentParser, ParsedDocument, ParserInput};
use crate::domain::DomainError;

/// Extracts page text from PDF files.
///
/// A page whose content stream cannot be decoded is skipped with a warning;
/// only a structurally invalid file fails the parse.
#[derive(Debug, Clone, Default)]
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }

    fn document_title(document: &Document) -> Option<String> {
        let info = document.trailer.get(b"Info").ok()?;

        let dictionary = match info {
            Object::Reference(id) => document.get_dictionary(*id).ok()?,
            Object::Dictionary(dictionary) => dictionary,
            _ => return None,
        };

        let raw = dictionary.get(b"Title").ok()?.as_str().ok()?;
        let title = decode_bytes(raw, None).text.trim().to_string();

        if title.is_empty() { None } else { Some(title) }
    }
}

#[async_trait]
impl DocumentParser for PdfParser {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError> {
        let document = Document::load_mem(input.content.as_bytes())
            .map_err(|e| DomainError::parse(self.name(), format!("Invalid PDF: {}", e)))?;

        let pages = document.get_pages();
        let mut texts = Vec::with_capacity(pages.len());

        for page in pages.keys() {
            match document.extract_text(&[*page]) {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        texts.push(text.to_string());
                    }
                }
                Err(e) => warn!(page = *page, error = %e, "Skipping unreadable PDF page"),
            }
        }

        debug!(pages = pages.len(), extracted = texts.len(), "Extracted PDF text");

        let content = texts.join("\n\n");

        let mut metadata = DocumentMetadata::new()
            .with_mime_type("application/pdf")
            .with_custom("page_count", serde_json::json!(pages.len()));

        if let Some(title) = Self::document_title(&document) {
            metadata = metadata.with_title(title);
        }

        let metadata = with_counts(metadata.with_input(&input), &content);

        Ok(ParsedDocument::new(content, metadata))
    }
}
