//! Error types for the stacklib library.

use thiserror::Error;

/// Main error type for STACK operations.
#[derive(Error, Debug)]
pub enum StackError {
    /// Network request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O error (reading upload sources, writing downloads).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Login did not return a redirect.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Server denied access (HTTP 403), e.g. user administration
    /// without an administrator account.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Remote path or user does not exist.
    #[error("No such file or directory: {0}")]
    NotFound(String),

    /// A file was requested but the path is a directory, or vice versa.
    #[error("{0}")]
    TypeMismatch(String),

    /// A caller-supplied argument failed validation before any request
    /// was issued.
    #[error("{0}")]
    InvalidArgument(String),

    /// Unexpected HTTP status from the API channel.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// A batched update action did not report `"status": "ok"`.
    /// The raw server response is kept for inspection.
    #[error("Remote action failed: {message}")]
    ActionFailed {
        message: String,
        response: Option<serde_json::Value>,
    },

    /// WebDAV transfer-channel failure (upload, download, move, mkdir).
    #[error("Transfer failed: {0}")]
    Transfer(String),
}

/// Result type alias for stacklib operations.
pub type Result<T> = std::result::Result<T, StackError>;

impl StackError {
    /// Build an action failure from a server response, quoting the
    /// response body in the message.
    pub(crate) fn action_failed(what: &str, response: serde_json::Value) -> Self {
        StackError::ActionFailed {
            message: format!("{}, expected status 'ok' and got: {}", what, response),
            response: Some(response),
        }
    }
}
