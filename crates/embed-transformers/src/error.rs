//! Embedding error types.

use std::time::Duration;

use thiserror::Error;

use embed_types::ConfigError;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Invalid parameters or model identifier, surfaced at construction or first use
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The pipeline failed while embedding
    #[error("Inference error: {0}")]
    Inference(String),

    /// Candle model error
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Tokenizer error
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Download error
    #[error("Failed to download model: {0}")]
    Download(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Pipeline output does not have the expected shape
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Pipeline invocation exceeded the configured deadline
    #[error("Pipeline call timed out after {0:?}")]
    Timeout(Duration),

    /// Blocking inference task panicked or was cancelled
    #[error("Inference task failed: {0}")]
    Task(String),
}

impl EmbeddingError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an inference error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create a shape mismatch error.
    pub fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// True for failures caused by configuration rather than inference.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<ConfigError> for EmbeddingError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<tokio::task::JoinError> for EmbeddingError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_from_config_error() {
        let err: EmbeddingError = ConfigError::invalid("batch_size", "must be > 0").into();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_shape_display() {
        let err = EmbeddingError::shape("[2, d]", "[3, 384]");
        assert_eq!(err.to_string(), "Shape mismatch: expected [2, d], got [3, 384]");
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_timeout_display() {
        let err = EmbeddingError::Timeout(Duration::from_millis(50));
        assert!(err.to_string().contains("50ms"));
    }
}
