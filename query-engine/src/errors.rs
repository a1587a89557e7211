//! Typed errors for the query pipeline.

use std::time::Duration;

use ai_llm_service::AiLlmError;
use thiserror::Error;

/// A question that violates the length bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("question must be at least {min} character(s) long, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("question must be at most {max} characters long, got {actual}")]
    TooLong { max: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum QueryError {
    /// Caller input rejected before any model or history interaction.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Provider call failed, including failures reported mid-stream.
    #[error("failed to generate an answer: {0}")]
    Model(#[from] AiLlmError),

    /// Provider call succeeded but produced no text.
    #[error("failed to generate an answer: model returned an empty response")]
    EmptyAnswer,

    /// No answer (or next fragment) arrived within the deadline.
    #[error("model did not respond within {0:?}")]
    Timeout(Duration),
}

impl QueryError {
    /// `true` when the caller is at fault, `false` for model-side failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::Validation(_))
    }
}
