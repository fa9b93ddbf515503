//! Error types shared by the assistance services.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by stores, collaborator clients and configuration loading.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Transport-level failure talking to another service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Another service answered with an unexpected status
    #[error("{service} returned non-success status: {status}")]
    Upstream { service: &'static str, status: u16 },

    /// Token balance exhausted, or the user has no ledger row
    #[error("insufficient funds or user not found")]
    InsufficientFunds,

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected because it would duplicate or contradict existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Auth(_) => 401,
            Error::InsufficientFunds => 402,
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            _ => 500,
        }
    }

    /// True for timeouts and connection failures, as opposed to an answer we did not like.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_timeout() || e.is_connect())
    }
}
