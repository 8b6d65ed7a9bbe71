//! Parser and chunker registrations

use std::sync::Arc;

use super::chunkers::{
    FixedSizeChunker, ParagraphChunker, RecursiveChunker, SemanticChunker, SentenceChunker,
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_SIMILARITY_THRESHOLD,
};
use super::parsers::{
    AutoParser, CsvParser, DocxParser, HtmlParser, JsonParser, MarkdownParser, PdfParser,
    TextParser, AUTO_PARSER_KEY,
};
use crate::domain::component::{
    ComponentCategory, ComponentDescriptor, ComponentFactory, ComponentRegistry, ConfigField,
    ConfigSchema, ResolvedConfig,
};
use crate::domain::ingestion::{ChunkingStrategy, DocumentParser};
use crate::domain::DomainError;
use crate::infrastructure::embedding::{HashingModel, DEFAULT_LOCAL_MODEL};

fn parser_descriptor(parser: &dyn DocumentParser, name: &str, description: &str) -> ComponentDescriptor {
    ComponentDescriptor::new(ComponentCategory::Parser, parser.name(), name)
        .with_description(description)
        .with_extensions(parser.supported_extensions())
}

fn encoding_schema() -> ConfigSchema {
    ConfigSchema::new().field(
        ConfigField::string("encoding")
            .describe("Declared text encoding, tried after BOM detection (e.g. 'windows-1252')"),
    )
}

/// Apply the optional `encoding` option through a parser's builder
fn with_declared_encoding<P>(
    parser: P,
    config: &ResolvedConfig,
    apply: fn(P, &str) -> Result<P, DomainError>,
) -> Result<P, DomainError> {
    match config.get_str("encoding") {
        Some(label) => apply(parser, label),
        None => Ok(parser),
    }
}

/// Build the parser factory with the built-in variants
pub fn parser_factory() -> Result<ComponentFactory<dyn DocumentParser>, DomainError> {
    let factory: ComponentFactory<dyn DocumentParser> =
        ComponentFactory::new(ComponentCategory::Parser);

    factory.register(
        parser_descriptor(&TextParser::new(), "Plain Text", "Decoded text as-is")
            .with_schema(encoding_schema()),
        |config, _ctx| {
            let parser = with_declared_encoding(TextParser::new(), &config, TextParser::with_encoding)?;
            Ok(Arc::new(parser) as Arc<dyn DocumentParser>)
        },
    )?;

    factory.register(
        parser_descriptor(&MarkdownParser::new(), "Markdown", "Markdown rendered to plain text")
            .with_schema(encoding_schema()),
        |config, _ctx| {
            let parser =
                with_declared_encoding(MarkdownParser::new(), &config, MarkdownParser::with_encoding)?;
            Ok(Arc::new(parser) as Arc<dyn DocumentParser>)
        },
    )?;

    factory.register(
        parser_descriptor(&HtmlParser::new(), "HTML", "Visible text of an HTML page")
            .with_schema(encoding_schema()),
        |config, _ctx| {
            let parser = with_declared_encoding(HtmlParser::new(), &config, HtmlParser::with_encoding)?;
            Ok(Arc::new(parser) as Arc<dyn DocumentParser>)
        },
    )?;

    factory.register(
        parser_descriptor(&CsvParser::new(), "CSV", "One paragraph of 'column: value' lines per row")
            .with_schema(
                encoding_schema()
                    .field(ConfigField::string("delimiter").with_default(","))
                    .field(ConfigField::boolean("has_headers").with_default(true)),
            ),
        |config, _ctx| {
            let mut parser = CsvParser::new()
                .with_delimiter(config.get_str("delimiter").unwrap_or(","))?
                .with_headers(config.get_bool("has_headers").unwrap_or(true));

            if let Some(label) = config.get_str("encoding") {
                parser = parser.with_encoding(label)?;
            }

            Ok(Arc::new(parser) as Arc<dyn DocumentParser>)
        },
    )?;

    factory.register(
        parser_descriptor(&JsonParser::new(), "JSON", "Pretty-printed JSON with a structure summary")
            .with_schema(encoding_schema()),
        |config, _ctx| {
            let parser = with_declared_encoding(JsonParser::new(), &config, JsonParser::with_encoding)?;
            Ok(Arc::new(parser) as Arc<dyn DocumentParser>)
        },
    )?;

    factory.register(
        parser_descriptor(&PdfParser::new(), "PDF", "Text extracted page by page"),
        |_config, _ctx| Ok(Arc::new(PdfParser::new()) as Arc<dyn DocumentParser>),
    )?;

    factory.register(
        parser_descriptor(&DocxParser::new(), "Word", "Paragraph text of word/document.xml"),
        |_config, _ctx| Ok(Arc::new(DocxParser::new()) as Arc<dyn DocumentParser>),
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Parser, AUTO_PARSER_KEY, "Auto")
            .with_description("Selects a parser from the file extension"),
        |_config, ctx| Ok(Arc::new(AutoParser::new(ctx.clone())) as Arc<dyn DocumentParser>),
    )?;

    Ok(factory)
}

fn chunk_size_field() -> ConfigField {
    ConfigField::integer("chunk_size")
        .with_default(DEFAULT_CHUNK_SIZE)
        .with_min(1.0)
        .describe("Maximum chunk length in characters")
}

fn chunk_size(config: &ResolvedConfig) -> usize {
    config.get_usize("chunk_size").unwrap_or(DEFAULT_CHUNK_SIZE)
}

/// Build the chunker factory with the built-in variants
pub fn chunker_factory() -> Result<ComponentFactory<dyn ChunkingStrategy>, DomainError> {
    let factory: ComponentFactory<dyn ChunkingStrategy> =
        ComponentFactory::new(ComponentCategory::Chunker);

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Chunker, "fixed_size", "Fixed Size")
            .with_description("Sliding character windows with overlap")
            .with_schema(
                ConfigSchema::new()
                    .field(chunk_size_field())
                    .field(
                        ConfigField::integer("chunk_overlap")
                            .with_default(DEFAULT_CHUNK_OVERLAP)
                            .with_min(0.0),
                    )
                    .field(ConfigField::boolean("strip_whitespace").with_default(true)),
            ),
        |config, _ctx| {
            let chunker = FixedSizeChunker::new(
                chunk_size(&config),
                config.get_usize("chunk_overlap").unwrap_or(DEFAULT_CHUNK_OVERLAP),
            )
            .with_strip_whitespace(config.get_bool("strip_whitespace").unwrap_or(true));

            Ok(Arc::new(chunker) as Arc<dyn ChunkingStrategy>)
        },
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Chunker, "recursive", "Recursive")
            .with_description("Paragraph, line, sentence, word and character splits, merged up to size")
            .with_schema(ConfigSchema::new().field(chunk_size_field())),
        |config, _ctx| {
            Ok(Arc::new(RecursiveChunker::new(chunk_size(&config))) as Arc<dyn ChunkingStrategy>)
        },
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Chunker, "sentence", "Sentence")
            .with_description("Unicode sentences merged up to size")
            .with_schema(
                ConfigSchema::new()
                    .field(chunk_size_field())
                    .field(
                        ConfigField::integer("sentence_overlap")
                            .with_default(0)
                            .with_min(0.0)
                            .describe("Sentences repeated at the start of the next chunk"),
                    ),
            ),
        |config, _ctx| {
            let chunker = SentenceChunker::new(chunk_size(&config))
                .with_sentence_overlap(config.get_usize("sentence_overlap").unwrap_or(0));
            Ok(Arc::new(chunker) as Arc<dyn ChunkingStrategy>)
        },
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Chunker, "paragraph", "Paragraph")
            .with_description("Blank-line paragraphs merged up to size")
            .with_schema(ConfigSchema::new().field(chunk_size_field())),
        |config, _ctx| {
            Ok(Arc::new(ParagraphChunker::new(chunk_size(&config))) as Arc<dyn ChunkingStrategy>)
        },
    )?;

    factory.register(
        ComponentDescriptor::new(ComponentCategory::Chunker, "semantic", "Semantic")
            .with_description("Sentences grouped while adjacent similarity stays above a threshold")
            .with_schema(
                ConfigSchema::new()
                    .field(chunk_size_field())
                    .field(
                        ConfigField::float("similarity_threshold")
                            .with_default(DEFAULT_SIMILARITY_THRESHOLD)
                            .with_range(-1.0, 1.0),
                    )
                    .field(ConfigField::string("model").with_default(DEFAULT_LOCAL_MODEL))
                    .field(ConfigField::integer("dimensions").with_min(1.0)),
            ),
        |config, _ctx| {
            let model = HashingModel::load(
                config.get_str("model").unwrap_or(DEFAULT_LOCAL_MODEL),
                config.get_usize("dimensions"),
                None,
            )?;

            let chunker = SemanticChunker::new(model, chunk_size(&config)).with_similarity_threshold(
                config
                    .get_f64("similarity_threshold")
                    .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
            );

            Ok(Arc::new(chunker) as Arc<dyn ChunkingStrategy>)
        },
    )?;

    Ok(factory)
}

pub fn register_parsers(registry: &ComponentRegistry) -> Result<(), DomainError> {
    registry.register_factory(
        ComponentCategory::Parser.factory_name(),
        Arc::new(parser_factory()?),
    );
    Ok(())
}

pub fn register_chunkers(registry: &ComponentRegistry) -> Result<(), DomainError> {
    registry.register_factory(
        ComponentCategory::Chunker.factory_name(),
        Arc::new(chunker_factory()?),
    );
    Ok(())
}
