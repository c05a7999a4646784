//! Typed error for the answer-engine crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnswerError {
    /// Errors from the hosted chat model.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Errors from the post index (configuration only; searches never fail).
    #[error("index error: {0}")]
    Index(#[from] forum_index::IndexError),

    /// Canned answers file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Canned answers file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid canned answer entry.
    #[error("invalid canned answer `{id}`: {reason}")]
    InvalidCanned { id: String, reason: &'static str },
}
