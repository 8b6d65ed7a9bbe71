//! JSON document parser

use async_trait::async_trait;
use encoding_rs::Encoding;

use super::encoding::{decode_content, resolve_encoding};
use super::with_counts;
use crate::domain::ingestion::{DocumentMetadata, DocumentParser, ParsedDocument, ParserInput};
use crate::domain::DomainError;

/// Parser for JSON files; content is the pretty-printed document
#[derive(Debug, Clone, Default)]
pub struct JsonParser {
    encoding: Option<&'static Encoding>,
}

impl JsonParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(mut self, label: &str) -> Result<Self, DomainError> {
        self.encoding = Some(resolve_encoding(label)?);
        Ok(self)
    }
}

#[async_trait]
impl DocumentParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }

    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError> {
        let decoded = decode_content(&input.content, self.encoding);

        let json_value: serde_json::Value = serde_json::from_str(&decoded.text)
            .map_err(|e| DomainError::parse(self.name(), format!("Invalid JSON: {}", e)))?;

        let content = serde_json::to_string_pretty(&json_value)
            .map_err(|e| DomainError::parse(self.name(), format!("Failed to serialize JSON: {}", e)))?;

        let metadata = DocumentMetadata::new()
            .with_mime_type("application/json")
            .with_custom(
                "json_structure",
                serde_json::Value::String(Self::describe_structure(&json_value)),
            )
            .with_input(&input);

        let metadata = with_counts(decoded.annotate(metadata), &content);

        Ok(ParsedDocument::new(content, metadata))
    }
}

impl JsonParser {
    fn describe_structure(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::Null => "null".to_string(),
            serde_json::Value::Bool(_) => "boolean".to_string(),
            serde_json::Value::Number(_) => "number".to_string(),
            serde_json::Value::String(_) => "string".to_string(),
            serde_json::Value::Array(arr) => {
                if arr.is_empty() {
                    "array[]".to_string()
                } else {
                    format!("array[{}]", arr.len())
                }
            }
            serde_json::Value::Object(obj) => {
                let keys: Vec<&str> = obj.keys().map(|k| k.as_str()).take(5).collect();
                if keys.len() < obj.len() {
                    format!("object{{{},...}}", keys.join(", "))
                } else {
                    format!("object{{{}}}", keys.join(", "))
                }
            }
        }
    }
}
