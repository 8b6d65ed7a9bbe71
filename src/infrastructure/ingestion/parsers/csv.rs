//! CSV document parser

use async_trait::async_trait;
use encoding_rs::Encoding;

use super::encoding::{decode_content, resolve_encoding};
use super::with_counts;
use crate::domain::ingestion::{DocumentMetadata, DocumentParser, ParsedDocument, ParserInput};
use crate::domain::DomainError;

/// Parser for delimited text.
///
/// Each record becomes a paragraph of `column: value` lines. Rows with more
/// or fewer fields than the header are accepted.
#[derive(Debug, Clone)]
pub struct CsvParser {
    delimiter: u8,
    has_headers: bool,
    encoding: Option<&'static Encoding>,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            encoding: None,
        }
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field delimiter, a single ASCII character
    pub fn with_delimiter(mut self, delimiter: &str) -> Result<Self, DomainError> {
        self.delimiter = match delimiter.as_bytes() {
            [byte] if byte.is_ascii() => *byte,
            _ => {
                return Err(DomainError::configuration(format!(
                    "CSV delimiter must be a single ASCII character, got '{}'",
                    delimiter
                )));
            }
        };
        Ok(self)
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn with_encoding(mut self, label: &str) -> Result<Self, DomainError> {
        self.encoding = Some(resolve_encoding(label)?);
        Ok(self)
    }

    fn column_name(columns: &[String], position: usize) -> String {
        columns
            .get(position)
            .filter(|c| !c.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("column_{}", position + 1))
    }

    fn render(&self, text: &str) -> Result<(String, Vec<String>, usize), DomainError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .flexible(true)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = if self.has_headers {
            reader
                .headers()
                .map_err(|e| DomainError::parse(self.name(), format!("Invalid CSV header: {}", e)))?
                .iter()
                .map(|h| h.trim().to_string())
                .collect()
        } else {
            Vec::new()
        };

        let mut paragraphs = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                DomainError::parse(self.name(), format!("Unreadable CSV record {}: {}", row + 1, e))
            })?;

            let lines: Vec<String> = record
                .iter()
                .enumerate()
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(i, value)| format!("{}: {}", Self::column_name(&columns, i), value.trim()))
                .collect();

            if !lines.is_empty() {
                paragraphs.push(lines.join("\n"));
            }
        }

        let rows = paragraphs.len();
        Ok((paragraphs.join("\n\n"), columns, rows))
    }
}

#[async_trait]
impl DocumentParser for CsvParser {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["csv", "tsv"]
    }

    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError> {
        let decoded = decode_content(&input.content, self.encoding);
        let (content, columns, rows) = self.render(&decoded.text)?;

        let metadata = DocumentMetadata::new()
            .with_mime_type("text/csv")
            .with_custom("row_count", serde_json::json!(rows))
            .with_custom("columns", serde_json::json!(columns))
            .with_input(&input);

        let metadata = with_counts(decoded.annotate(metadata), &content);

        Ok(ParsedDocument::new(content, metadata))
    }
}
