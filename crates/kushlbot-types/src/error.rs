use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in kushlbot-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors surfaced by chat operations.
///
/// Each variant corresponds to one HTTP status at the API boundary.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request carried no usable message text.
    #[error("{0}")]
    InvalidInput(String),

    /// The chat does not exist or belongs to another browser session.
    #[error("chat not found")]
    NotFound,

    /// The upstream model did not answer in time.
    #[error("request timed out")]
    Timeout,

    /// The upstream model answered with an error or an unusable body.
    #[error("{0}")]
    Upstream(String),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl From<LlmError> for ChatError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout => ChatError::Timeout,
            other => ChatError::Upstream(other.to_string()),
        }
    }
}
