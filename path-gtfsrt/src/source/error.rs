//! Source API error types.

use std::sync::Arc;
use std::time::Duration;

/// Errors from fetching or parsing upstream data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed (connection, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not what we expected
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Call did not finish before its deadline
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Caller cancelled the call
    #[error("cancelled")]
    Cancelled,

    /// The fetching task ended without reporting a result
    #[error("fetch task failed: {0}")]
    Task(String),

    /// A failure captured by the shared response cache and replayed to
    /// every caller inside the TTL window
    #[error(transparent)]
    Shared(Arc<SourceError>),
}

impl SourceError {
    pub(crate) fn json(err: serde_json::Error) -> Self {
        SourceError::Json {
            message: err.to_string(),
        }
    }

    /// True if this error (or the error it replays) is a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            SourceError::Timeout(_) => true,
            SourceError::Shared(inner) => inner.is_timeout(),
            _ => false,
        }
    }
}
