//! Client for chat summarization via the LLM gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{http_client, join_url};
use crate::{Error, Result};

/// Produces a text summary of a chat session's history.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, chat_session_id: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    chat_session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary: String,
}

/// Summarizer backed by the LLM gateway's `/chat/summarize` endpoint.
pub struct HttpSummarizer {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSummarizer {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, chat_session_id: &str) -> Result<String> {
        let response = self
            .http
            .post(join_url(&self.base_url, "/chat/summarize"))
            .json(&SummarizeRequest { chat_session_id })
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(Error::Upstream {
                service: "LLM gateway",
                status,
            });
        }

        let summary = response.json::<SummarizeResponse>().await?.summary;
        if summary.trim().is_empty() {
            return Err(Error::Internal("LLM gateway returned an empty summary".to_string()));
        }
        Ok(summary)
    }
}
