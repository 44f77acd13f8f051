use thiserror::Error;

use crate::llm::LlmError;

/// Errors from storage operations (used by trait definitions in personachat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("invalid write: {0}")]
    Invalid(String),
}

/// Errors surfaced by the conversation service.
///
/// Storage and engine specific representations are flattened into these
/// kinds at the service boundary.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// The persistence layer could not be reached or failed. Partial state is
    /// unknown; callers must re-read before retrying.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The completion engine failed, timed out, or returned nothing usable.
    /// The user's turn stays stored; no assistant turn was written.
    #[error("completion failed: {0}")]
    CompletionFailed(String),

    /// The store refused the write as malformed. Nothing was written.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<RepositoryError> for ConversationError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Invalid(reason) => ConversationError::InvalidRequest(reason),
            other => ConversationError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<LlmError> for ConversationError {
    fn from(e: LlmError) -> Self {
        ConversationError::CompletionFailed(e.to_string())
    }
}
