//! Error types for the FAQ retrieval system.

use thiserror::Error;

/// Result type alias using FaqError.
pub type Result<T> = std::result::Result<T, FaqError>;

/// Errors that can occur in the FAQ retrieval system.
#[derive(Error, Debug)]
pub enum FaqError {
    /// Invalid fusion weights, rank-bias constant, or other configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A retriever failed to produce its ranked list.
    #[error("Retriever '{retriever}' failed: {message}")]
    Retrieval { retriever: String, message: String },

    /// Embedding backend error.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// Query generation (language model) error.
    #[error("Query generation error: {message}")]
    Generation { message: String },

    /// Chunking error.
    #[error("Chunking error: {message}")]
    Chunking { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FaqError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a retrieval error attributed to a named retriever.
    pub fn retrieval(retriever: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Retrieval {
            retriever: retriever.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a query generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a chunking error.
    pub fn chunking(message: impl Into<String>) -> Self {
        Self::Chunking {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG_ERROR",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Retrieval { .. } => "RETRIEVAL_ERROR",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::Generation { .. } => "GENERATION_ERROR",
            Self::Chunking { .. } => "CHUNKING_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether this error was caused by invalid configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FaqError::retrieval("bm25", "index not built");
        let msg = err.to_string();
        assert!(msg.contains("bm25"));
        assert!(msg.contains("index not built"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(FaqError::config("bad weight").error_code(), "CONFIG_ERROR");
        assert_eq!(
            FaqError::embedding("dimension mismatch").error_code(),
            "EMBEDDING_ERROR"
        );
        assert!(FaqError::config("x").is_config());
        assert!(!FaqError::internal("x").is_config());
    }
}
