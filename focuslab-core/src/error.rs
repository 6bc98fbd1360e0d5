//! Error types for focuslab-core

use thiserror::Error;

/// Outcome of a failed trigger request.
///
/// Status-derived kinds map one-to-one onto the HTTP status the API returned.
/// `Transport` covers every failure that happens before a status is known.
#[derive(Error, Debug)]
pub enum TriggerError {
    /// The API key was rejected (401 or 403)
    #[error("the API key was rejected ({status})")]
    BadApiKey { status: u16 },

    /// The API rejected the payload as malformed (400)
    #[error("FocusLab rejected the request because it wasn't properly formed")]
    BadRequest,

    /// The API returned 404; the endpoint or resource name is probably wrong
    #[error("resource not found; check the endpoint and resource name")]
    ResourceNotFound,

    /// The FocusLab service failed (500)
    #[error("FocusLab server error")]
    ServerError,

    /// Any other non-201 status
    #[error("FocusLab returned an unexpected status code: {status}")]
    UnknownError { status: u16 },

    /// Connection, DNS, TLS or timeout failure
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The configured endpoint cannot be used as a base URL
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl TriggerError {
    /// Map a non-201 HTTP status onto its error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => TriggerError::BadApiKey { status },
            400 => TriggerError::BadRequest,
            404 => TriggerError::ResourceNotFound,
            500 => TriggerError::ServerError,
            _ => TriggerError::UnknownError { status },
        }
    }

    /// Whether a later attempt with the same event may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TriggerError::ServerError
                | TriggerError::UnknownError { .. }
                | TriggerError::Transport(_)
        )
    }

    /// The HTTP status this error was derived from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TriggerError::BadApiKey { status } => Some(*status),
            TriggerError::BadRequest => Some(400),
            TriggerError::ResourceNotFound => Some(404),
            TriggerError::ServerError => Some(500),
            TriggerError::UnknownError { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TriggerError {
    fn from(err: reqwest::Error) -> Self {
        TriggerError::Transport(err.to_string())
    }
}

/// Main error type for the focuslab-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Trigger request error
    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

/// Result type alias for focuslab-core
pub type Result<T> = std::result::Result<T, Error>;
