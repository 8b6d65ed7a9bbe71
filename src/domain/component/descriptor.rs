//! Component categories and descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

use super::schema::ConfigSchema;

/// Closed set of pipeline component categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentCategory {
    Parser,
    Chunker,
    Embedder,
    Indexer,
    Searcher,
    Optimizer,
}

impl ComponentCategory {
    /// All categories in pipeline order
    pub const ALL: [ComponentCategory; 6] = [
        Self::Parser,
        Self::Chunker,
        Self::Embedder,
        Self::Indexer,
        Self::Searcher,
        Self::Optimizer,
    ];

    /// Name under which the category's factory is registered
    pub fn factory_name(&self) -> &'static str {
        match self {
            Self::Parser => "parsers",
            Self::Chunker => "chunkers",
            Self::Embedder => "embedders",
            Self::Indexer => "indexers",
            Self::Searcher => "searchers",
            Self::Optimizer => "optimizers",
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.factory_name())
    }
}

/// Static description of a registered component variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub category: ComponentCategory,
    /// Lookup key, case-sensitive
    pub key: String,
    pub name: String,
    pub description: String,
    pub schema: ConfigSchema,
    /// File extensions handled (parsers only), lowercase without the dot
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
}

impl ComponentDescriptor {
    pub fn new(
        category: ComponentCategory,
        key: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            category,
            key: key.into(),
            name: name.into(),
            description: String::new(),
            schema: ConfigSchema::new(),
            extensions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_schema(mut self, schema: ConfigSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Case-insensitive extension match, leading dot ignored
    pub fn handles_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}
