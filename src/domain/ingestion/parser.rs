//! Document parser trait and types

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Content input for document parsing
#[derive(Debug, Clone)]
pub enum ParserContent {
    /// Text content (already decoded)
    Text(String),
    /// Binary content (needs decoding)
    Bytes(Bytes),
}

impl ParserContent {
    /// Create text content
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Create binary content
    pub fn bytes(content: impl Into<Bytes>) -> Self {
        Self::Bytes(content.into())
    }

    /// Raw bytes of the content; text is returned as its UTF-8 encoding
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Bytes(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Input for document parsing
#[derive(Debug, Clone)]
pub struct ParserInput {
    /// Document content (text or bytes)
    pub content: ParserContent,
    /// Optional filename, used for extension-based parser selection
    pub filename: Option<String>,
    /// Additional metadata carried into the parsed document
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ParserInput {
    /// Create input from text content
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            content: ParserContent::text(content),
            filename: None,
            metadata: HashMap::new(),
        }
    }

    /// Create input from binary content
    pub fn from_bytes(content: impl Into<Bytes>) -> Self {
        Self {
            content: ParserContent::bytes(content),
            filename: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the filename
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Lowercase extension of the filename's last path component, without the dot
    pub fn extension(&self) -> Option<String> {
        let filename = self.filename.as_deref()?;
        let name = filename.rsplit(['/', '\\']).next()?;
        let (_, ext) = name.rsplit_once('.')?;

        if ext.is_empty() {
            None
        } else {
            Some(ext.to_lowercase())
        }
    }
}

/// Metadata extracted from a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Source file or URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Text encoding actually used to decode the input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Format-specific fields (counts, structure summaries, caller metadata)
    #[serde(flatten)]
    pub custom: HashMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.custom.insert(key.into(), value);
        self
    }

    /// Attach the filename and caller metadata from the parser input
    pub fn with_input(mut self, input: &ParserInput) -> Self {
        if let Some(ref filename) = input.filename {
            self.source = Some(filename.clone());
        }

        for (key, value) in &input.metadata {
            self.custom.entry(key.clone()).or_insert_with(|| value.clone());
        }

        self
    }

    /// Convert to a flat JSON map
    pub fn to_json_map(&self) -> HashMap<String, serde_json::Value> {
        let mut map = self.custom.clone();

        let fields = [
            ("title", &self.title),
            ("source", &self.source),
            ("mime_type", &self.mime_type),
            ("encoding", &self.encoding),
        ];

        for (key, value) in fields {
            if let Some(value) = value {
                map.insert(key.to_string(), serde_json::Value::String(value.clone()));
            }
        }

        map
    }
}

/// Result of parsing a document
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Extracted text content
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl ParsedDocument {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn from_content(content: impl Into<String>) -> Self {
        Self::new(content, DocumentMetadata::new())
    }
}

/// Trait for document parsers
#[async_trait]
pub trait DocumentParser: Send + Sync + Debug {
    /// Component key of this parser
    fn name(&self) -> &'static str;

    /// Get supported file extensions (e.g., ["txt", "text"])
    fn supported_extensions(&self) -> &[&str];

    /// Parse a document and extract text content and metadata
    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError>;

    /// Check if this parser supports a given filename
    fn supports_file(&self, filename: &str) -> bool {
        let ext = filename
            .rsplit('.')
            .next()
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&ext))
    }
}
