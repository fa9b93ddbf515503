//! Clients for the services the request orchestrator depends on.
//!
//! Each collaborator sits behind a trait so the orchestrator can be composed with the
//! HTTP implementations in production and with fakes in tests.

mod bedrock;
mod billing;
mod chat;
mod summarizer;

pub use bedrock::BedrockSummarizer;
pub use billing::{BillingClient, HttpBillingClient};
pub use chat::{ChatClient, HttpChatClient};
pub use summarizer::{HttpSummarizer, Summarizer};

use std::time::Duration;

use crate::{Error, Result};

/// Build a reqwest client whose every call is bounded by `timeout`.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(Error::Http)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
