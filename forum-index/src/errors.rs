//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for forum-index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Returned vector has the wrong dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Provider returned a different number of vectors than inputs.
    #[error("embedding count mismatch: got {got}, want {want}")]
    CountMismatch { got: usize, want: usize },

    /// No embedding backend available.
    #[error("missing embedding and no provider supplied")]
    MissingEmbedding,

    /// Hosted embedding API failure.
    #[error("embedding provider error: {0}")]
    Provider(#[from] ai_llm_service::AiLlmError),
}
