//! Client for the chat gateway, which fronts the third-party conversations API.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{http_client, join_url};
use crate::models::ChatMessage;
use crate::{Error, Result};

/// Participant management and history for chat sessions.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn add_participant(&self, chat_session_id: &str, identity: &str) -> Result<()>;

    async fn remove_participant(&self, chat_session_id: &str, identity: &str) -> Result<()>;

    async fn history(&self, chat_session_id: &str) -> Result<Vec<ChatMessage>>;
}

#[derive(Debug, Serialize)]
struct ParticipantRequest<'a> {
    chat_session_id: &'a str,
    identity: &'a str,
}

/// Chat client that calls the chat gateway over HTTP.
pub struct HttpChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    async fn participant_call(&self, path: &str, chat_session_id: &str, identity: &str) -> Result<()> {
        let response = self
            .http
            .post(join_url(&self.base_url, path))
            .json(&ParticipantRequest {
                chat_session_id,
                identity,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Upstream {
                service: "chat gateway",
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn add_participant(&self, chat_session_id: &str, identity: &str) -> Result<()> {
        self.participant_call("/chat/participants/add", chat_session_id, identity)
            .await
    }

    async fn remove_participant(&self, chat_session_id: &str, identity: &str) -> Result<()> {
        self.participant_call("/chat/participants/remove", chat_session_id, identity)
            .await
    }

    async fn history(&self, chat_session_id: &str) -> Result<Vec<ChatMessage>> {
        let url = join_url(&self.base_url, &format!("/chat/history/{}", chat_session_id));
        let response = self.http.get(url).send().await?;

        if response.status().as_u16() == 404 {
            return Err(Error::NotFound(format!("chat session {}", chat_session_id)));
        }
        if !response.status().is_success() {
            return Err(Error::Upstream {
                service: "chat gateway",
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}
