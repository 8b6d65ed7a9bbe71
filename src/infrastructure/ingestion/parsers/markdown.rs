//! Markdown document parser

use async_trait::async_trait;
use encoding_rs::Encoding;
use pulldown_cmark::{Event, Parser, Tag};

use super::encoding::{decode_content, resolve_encoding};
use super::with_counts;
use crate::domain::ingestion::{DocumentMetadata, DocumentParser, ParsedDocument, ParserInput};
use crate::domain::DomainError;

/// Parser for Markdown files; markup is dropped, the first H1 becomes the title
#[derive(Debug, Clone, Default)]
pub struct MarkdownParser {
    encoding: Option<&'static Encoding>,
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(mut self, label: &str) -> Result<Self, DomainError> {
        self.encoding = Some(resolve_encoding(label)?);
        Ok(self)
    }

    /// Plain text, first H1 and heading count
    fn extract_text_and_title(markdown: &str) -> (String, Option<String>, usize) {
        let parser = Parser::new(markdown);
        let mut text = String::new();
        let mut title: Option<String> = None;
        let mut in_heading = false;
        let mut heading_level: i32 = 0;
        let mut current_heading = String::new();
        let mut headings = 0;

        for event in parser {
            match event {
                Event::Start(Tag::Heading(level, ..)) => {
                    in_heading = true;
                    headings += 1;
                    heading_level = level as i32;
                    current_heading.clear();
                }
                Event::End(Tag::Heading(..)) => {
                    if heading_level == 1 && title.is_none() {
                        title = Some(current_heading.trim().to_string());
                    }

                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&current_heading);
                    text.push('\n');
                    in_heading = false;
                    current_heading.clear();
                }
                Event::Text(t) | Event::Code(t) => {
                    if in_heading {
                        current_heading.push_str(&t);
                    } else {
                        text.push_str(&t);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if in_heading {
                        current_heading.push(' ');
                    } else {
                        text.push(' ');
                    }
                }
                Event::Start(Tag::Paragraph) => {
                    if !text.is_empty() && !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                Event::End(Tag::Paragraph) => {
                    text.push('\n');
                }
                Event::Start(Tag::Item) => {
                    if !text.is_empty() && !text.ends_with('\n') {
                        text.push('\n');
                    }
                    text.push_str("• ");
                }
                Event::End(Tag::Item) => {
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    if !text.is_empty() && !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                Event::End(Tag::CodeBlock(_)) => {
                    text.push('\n');
                }
                _ => {}
            }
        }

        let text = text
            .lines()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        (text, title, headings)
    }
}

#[async_trait]
impl DocumentParser for MarkdownParser {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError> {
        let decoded = decode_content(&input.content, self.encoding);
        let (content, title, headings) = Self::extract_text_and_title(&decoded.text);

        let mut metadata = DocumentMetadata::new()
            .with_mime_type("text/markdown")
            .with_custom("heading_count", serde_json::json!(headings));

        if let Some(t) = title {
            metadata = metadata.with_title(t);
        }

        let metadata = decoded.annotate(metadata.with_input(&input));
        let metadata = with_counts(metadata, &content);

        Ok(ParsedDocument::new(content, metadata))
    }
}
