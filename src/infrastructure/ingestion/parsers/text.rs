//! Plain text document parser

use async_trait::async_trait;
use encoding_rs::Encoding;

use super::encoding::{decode_content, resolve_encoding};
use super::with_counts;
use crate::domain::ingestion::{DocumentMetadata, DocumentParser, ParsedDocument, ParserInput};
use crate::domain::DomainError;

/// Parser for plain text files.
///
/// Byte input always decodes; see [`super::encoding::decode_bytes`].
#[derive(Debug, Clone, Default)]
pub struct TextParser {
    encoding: Option<&'static Encoding>,
}

impl TextParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared encoding, tried before the fallback list
    pub fn with_encoding(mut self, label: &str) -> Result<Self, DomainError> {
        self.encoding = Some(resolve_encoding(label)?);
        Ok(self)
    }
}

#[async_trait]
impl DocumentParser for TextParser {
    fn name(&self) -> &'static str {
        "text"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "text", "log"]
    }

    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError> {
        let decoded = decode_content(&input.content, self.encoding);

        let metadata = decoded.annotate(
            DocumentMetadata::new()
                .with_mime_type("text/plain")
                .with_input(&input),
        );
        let metadata = with_counts(metadata, &decoded.text);

        Ok(ParsedDocument::new(decoded.text, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parse_text_content() {
        let parser = TextParser::new();
        let input = ParserInput::from_text("Hello, World!");

        let result = parser.parse(input).await.unwrap();

        assert_eq!(result.content, "Hello, World!");
        assert_eq!(result.metadata.mime_type, Some("text/plain".to_string()));
        assert_eq!(result.metadata.encoding, Some("utf-8".to_string()));
        assert_eq!(
            result.metadata.custom.get("word_count"),
            Some(&serde_json::json!(2))
        );
    }

    #[tokio::test]
    async fn test_parse_bytes_content() {
        let parser = TextParser::new();
        let input = ParserInput::from_bytes(b"Hello from bytes".to_vec());

        let result = parser.parse(input).await.unwrap();

        assert_eq!(result.content, "Hello from bytes");
    }

    #[tokio::test]
    async fn test_parse_with_filename_and_metadata() {
        let parser = TextParser::new();
        let input = ParserInput::from_text("content")
            .with_filename("test.txt")
            .with_metadata("custom_key", serde_json::json!("custom_value"));

        let result = parser.parse(input).await.unwrap();

        assert_eq!(result.metadata.source, Some("test.txt".to_string()));
        assert_eq!(
            result.metadata.custom.get("custom_key"),
            Some(&serde_json::json!("custom_value"))
        );
    }

    #[tokio::test]
    async fn test_parse_invalid_utf8_never_fails() {
        let parser = TextParser::new();
        let input = ParserInput::from_bytes(vec![b'n', b'a', b'i', 0xef, b'v', 0xe9, 0x80]);

        let result = parser.parse(input).await.unwrap();

        assert!(!result.content.is_empty());
        assert_eq!(result.metadata.encoding, Some("windows-1252".to_string()));
        assert!(result.content.starts_with("nai"));
    }

    #[tokio::test]
    async fn test_declared_encoding() {
        let parser = TextParser::new().with_encoding("iso-8859-15").unwrap();
        let input = ParserInput::from_bytes(vec![b'5', 0xa4]);

        let result = parser.parse(input).await.unwrap();

        assert_eq!(result.content, "5€");
        assert_eq!(result.metadata.encoding, Some("iso-8859-15".to_string()));
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        assert!(TextParser::new().with_encoding("not-an-encoding").is_err());
    }

    #[test]
    fn test_supports_file() {
        let parser = TextParser::new();
        assert!(parser.supports_file("document.txt"));
        assert!(parser.supports_file("document.TXT"));
        assert!(!parser.supports_file("document.md"));
    }
}
