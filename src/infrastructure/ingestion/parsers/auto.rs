//! Extension-dispatching parser

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::component::{ComponentConfig, ComponentContext, ComponentFactory};
use crate::domain::ingestion::{DocumentParser, ParsedDocument, ParserInput};
use crate::domain::DomainError;

/// Key of the dispatching parser, never returned by extension lookup
pub const AUTO_PARSER_KEY: &str = "auto";

impl ComponentFactory<dyn DocumentParser> {
    /// First registered parser (other than `auto`) declaring `extension`.
    ///
    /// Matching is case-insensitive and ignores a leading dot. The parser is
    /// created with its default options.
    pub fn get_parser_for_extension(
        &self,
        extension: &str,
        ctx: &ComponentContext,
    ) -> Result<Arc<dyn DocumentParser>, DomainError> {
        let descriptor = self
            .list_available()
            .into_iter()
            .filter(|d| d.key != AUTO_PARSER_KEY)
            .find(|d| d.handles_extension(extension))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "No parser registered for extension '{}'",
                    extension.trim_start_matches('.')
                ))
            })?;

        debug!(extension = %extension, parser = %descriptor.key, "Resolved parser by extension");

        self.create(&descriptor.key, &ComponentConfig::new(), ctx)
    }
}

/// Picks the parser from the input's file extension on every call
#[derive(Debug, Clone)]
pub struct AutoParser {
    ctx: ComponentContext,
}

impl AutoParser {
    pub fn new(ctx: ComponentContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl DocumentParser for AutoParser {
    fn name(&self) -> &'static str {
        AUTO_PARSER_KEY
    }

    fn supported_extensions(&self) -> &[&str] {
        &[]
    }

    fn supports_file(&self, filename: &str) -> bool {
        filename.contains('.')
    }

    async fn parse(&self, input: ParserInput) -> Result<ParsedDocument, DomainError> {
        let extension = match (&input.filename, input.extension()) {
            (Some(_), Some(extension)) => extension,
            (Some(filename), None) => {
                return Err(DomainError::validation(format!(
                    "Cannot detect a parser for '{}': no file extension",
                    filename
                )));
            }
            (None, _) => {
                return Err(DomainError::validation(
                    "The auto parser requires a filename",
                ));
            }
        };

        let parser = self
            .ctx
            .registry()
            .parsers()?
            .get_parser_for_extension(&extension, &self.ctx)?;

        parser.parse(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::ComponentRegistry;

    fn context() -> ComponentContext {
        ComponentContext::new(Arc::new(ComponentRegistry::with_builtins().unwrap()))
    }

    #[test]
    fn test_lookup_by_extension() {
        let ctx = context();
        let parsers = ctx.registry().parsers().unwrap();

        assert_eq!(parsers.get_parser_for_extension("md", &ctx).unwrap().name(), "markdown");
        assert_eq!(parsers.get_parser_for_extension(".HTM", &ctx).unwrap().name(), "html");
        assert_eq!(parsers.get_parser_for_extension("TXT", &ctx).unwrap().name(), "text");
    }

    #[test]
    fn test_unknown_extension_names_it() {
        let ctx = context();
        let parsers = ctx.registry().parsers().unwrap();

        let err = parsers.get_parser_for_extension(".xyz", &ctx).unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.to_string().contains("'xyz'"));
    }

    #[tokio::test]
    async fn test_auto_dispatches_on_filename() {
        let parser = AutoParser::new(context());
        let input = ParserInput::from_text("# Title\n\nBody").with_filename("notes.md");

        let result = parser.parse(input).await.unwrap();

        assert_eq!(result.metadata.title, Some("Title".to_string()));
        assert_eq!(result.metadata.mime_type, Some("text/markdown".to_string()));
    }

    #[tokio::test]
    async fn test_auto_requires_filename() {
        let parser = AutoParser::new(context());

        let result = parser.parse(ParserInput::from_text("text")).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }
}
