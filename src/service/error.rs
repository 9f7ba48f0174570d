//! Errors from the validation service and result sink.

use thiserror::Error;

/// Every variant is recoverable: the engine degrades to an unverified or unsaved attempt.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// No backend configured for this call.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The anti-cheat session is unknown or has expired server-side.
    #[error("session expired")]
    SessionExpired,

    /// The backend answered with a non-success status.
    #[error("rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Local persistence failed.
    #[error("storage error: {0}")]
    Storage(String),
}
