use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No {category} component registered under '{key}' (available: {})", .available.join(", "))]
    ComponentNotFound {
        category: String,
        key: String,
        available: Vec<String>,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Parse error ({parser}): {message}")]
    Parse { parser: String, message: String },

    #[error("Embedding provider error: {provider} - {message}")]
    EmbeddingProvider { provider: String, message: String },

    #[error("Failed to load model '{model}': {message}")]
    ModelLoad { model: String, message: String },

    #[error(
        "Dimension mismatch in collection '{collection}': expected {expected}, got {actual}"
    )]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("HTTP error{}: {message}", .status.map(|s| format!(" {}", s)).unwrap_or_default())]
    Http { status: Option<u16>, message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    #[error("Operation cancelled during {stage}")]
    Cancelled { stage: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn component_not_found(
        category: impl Into<String>,
        key: impl Into<String>,
        available: Vec<String>,
    ) -> Self {
        Self::ComponentNotFound {
            category: category.into(),
            key: key.into(),
            available,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn parse(parser: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            parser: parser.into(),
            message: message.into(),
        }
    }

    pub fn embedding_provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingProvider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn model_load(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            model: model.into(),
            message: message.into(),
        }
    }

    pub fn dimension_mismatch(collection: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            collection: collection.into(),
            expected,
            actual,
        }
    }

    pub fn http(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    pub fn cancelled(stage: impl Into<String>) -> Self {
        Self::Cancelled {
            stage: stage.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Rate limiting, server-side failures, transport failures without a
    /// status and timeouts are transient. Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status: None, .. } => true,
            Self::Http {
                status: Some(status),
                ..
            } => *status == 429 || (500..600).contains(status),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
