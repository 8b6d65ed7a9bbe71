//! Word (docx) document parser

use std::io::{Cursor, Read};

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::with_counts;
use crate::domain::ingestion::{DocumentMetadata, DocumentParser, ParsedDocument, ParserInput};
use crate::domain::DomainError;

const DOCUMENT_PART: &str = "word/document.xml";
const CORE_PART: &str = "docProps/core.xml";

/// Extracts paragraph text from Office Open XML word documents
#[derive(Debug, Clone, Default)]
pub struct DocxParser;

impl DocxParser {
    pub fn new() -> Self {
        Self
    }

    fn read_part(
        &self,
        archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
        name: &str,
    ) -> Result<Option<String>, DomainError> {
        let mut file = match archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(DomainError::parse(self.name(), format!("Cannot open {}: {}", name, e)));
            }
        };

        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| DomainError::parse(self.name(), format!("Cannot read {}: {}", name, e)))?;

        Ok(Some(xml))
    }

    fn xml_error(&self, part: &str, e: impl std::fmt::Display) -> DomainError {
        DomainError::parse(self.name(), format!("Malformed {}: {}", part, e))
    }

    /// Non-empty paragraph texts in document order. Only `t` elements carry
    /// text; `tab`, `br` and `cr` count inside runs only, so tab stops in
    /// paragraph properties are skipped. Nested paragraphs (text boxes) are
    /// emitted on their own.
    fn paragraphs(&self, xml: &str) -> Result<Vec<String>, DomainError> {
        let mut reader = Reader::from_str(xml);
        let mut open: Vec<String> = Vec::new();
        let mut paragraphs = Vec::new();
        let mut run_depth = 0usize;
        let mut in_text = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| self.xml_error(DOCUMENT_PART, e))?;

            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"p" => open.push(String::new()),
                    b"r" => run_depth += 1,
                    b"t" => in_text = true,
                    _ => {}
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"p" => {
                        if let Some(text) = open.pop() {
                            let text = text.trim();
                            if !text.is_empty() {
                                paragraphs.push(text.to_string());
                            }
                        }
                    }
                    b"r" => run_depth = run_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {}
                },
                Event::Empty(e) if run_depth > 0 => {
                    let break_char = match e.local_name().as_ref() {
                        b"tab" => Some('\t'),
                        b"br" | b"cr" => Some('\n'),
                        _ => None,
                    };

                    if let (Some(c), Some(current)) = (break_char, open.last_mut()) {
                        current.push(c);
                    }
                }
                Event::Text(e) if in_text => {
                    let text = e.unescape().map_err(|e| self.xml_error(DOCUMENT_PART, e))?;
                    if let Some(current) = open.last_mut() {
                        current.push_str(&text);
                    }
                }
                Event::CData(e) if in_text => {
                    let text = std::str::from_utf8(&e).map_err(|e| self.xml_error(DOCUMENT_PART, e))?;
                    if let Some(current) = open.last_mut() {
                        current.push_str(text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(paragraphs)
    }

    /// Text of the first `title` element of the core properties
    fn title(&self, xml: &str) -> Result<Option<String>, DomainError> {
        let mut reader = Reader::from_str(xml);
        let mut title: Option<String> = None;

        loop {
            match reader.read_event().map_err(|e| self.xml_error(CORE_PART, e))? {
                Event::Start(e) if e.local_name().as_ref() == b"title" => {
                    title = Some(String::new());
                }
                Event::Text(e) => {
                    if let Some(ref mut current) = title {
                        let text = e.unescape().map_err(|e| self.xml_error(CORE_PART, e))?;
                        current.push_str(&text);
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"title" => break,
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }
}

#[async_trait]
impl DocumentParser for DocxParser {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(input.content.as_bytes()))
            .map_err(|e| DomainError::parse(self.name(), format!("Invalid docx container: {}", e)))?;

        let document = self.read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| {
            DomainError::parse(self.name(), format!("Missing {} in docx container", DOCUMENT_PART))
        })?;

        let paragraphs = self.paragraphs(&document)?;
        let content = paragraphs.join("\n\n");

        let mut metadata = DocumentMetadata::new()
            .with_mime_type(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            )
            .with_custom("paragraph_count", serde_json::json!(paragraphs.len()));

        if let Some(core) = self.read_part(&mut archive, CORE_PART)? {
            if let Some(title) = self.title(&core)? {
                metadata = metadata.with_title(title);
            }
        }

        let metadata = with_counts(metadata.with_input(&input), &content);

        Ok(ParsedDocument::new(content, metadata))
    }
}
