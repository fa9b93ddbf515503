//! Errors raised by the request orchestrator.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, RequestError>;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller should prompt the user to buy more tokens.
    PaymentRequired,
    /// Lost a race or acted on a request in the wrong state; refresh and retry by hand.
    Conflict,
    NotFound,
    Forbidden,
    Validation,
    /// Anything else; retry later.
    Generic,
}

/// Every way an orchestrator step can fail, tagged by the step that failed.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("token debit failed: {0}")]
    PaymentRequired(#[source] shared::Error),

    #[error("could not reach billing: {0}")]
    Billing(#[source] shared::Error),

    #[error("could not summarize chat: {0}")]
    Summarize(#[source] shared::Error),

    #[error("could not save request: {0}")]
    Save(#[source] shared::Error),

    #[error("request not found or was already accepted")]
    AlreadyAccepted,

    #[error("request not found or was not active")]
    NotActive,

    #[error("could not fetch accepted request: {0}")]
    Fetch(#[source] shared::Error),

    #[error("failed to add expert to chat: {0}")]
    ChatJoin(#[source] shared::Error),

    #[error("request {0} not found")]
    NotFound(Uuid),

    #[error("request {0} is not resolved yet")]
    NotRated(Uuid),

    #[error("request {0} has already been rated")]
    AlreadyRated(Uuid),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Store(#[source] shared::Error),
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::PaymentRequired(_) => ErrorKind::PaymentRequired,
            RequestError::AlreadyAccepted
            | RequestError::NotActive
            | RequestError::NotRated(_)
            | RequestError::AlreadyRated(_) => ErrorKind::Conflict,
            RequestError::NotFound(_) => ErrorKind::NotFound,
            RequestError::Forbidden(_) => ErrorKind::Forbidden,
            RequestError::Validation(_) => ErrorKind::Validation,
            RequestError::Billing(_)
            | RequestError::Summarize(_)
            | RequestError::Save(_)
            | RequestError::Fetch(_)
            | RequestError::ChatJoin(_)
            | RequestError::Store(_) => ErrorKind::Generic,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::PaymentRequired => 402,
            ErrorKind::Conflict => 409,
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Validation => 400,
            ErrorKind::Generic => 500,
        }
    }
}
