//! Summarizer that reads chat history and asks a Bedrock model for the summary.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::types::{ContentBlock, ConversationRole, Message, SystemContentBlock};
use aws_sdk_bedrockruntime::Client as BedrockClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{ChatClient, Summarizer};
use crate::models::ChatMessage;
use crate::{Error, Result};

const SYSTEM_PROMPT: &str = "You prepare hand-off notes for a human support expert. \
Summarize the conversation between the user and the assistant in two or three sentences: \
what the user is trying to do, what has already been tried, and what is still broken. \
Do not greet the expert and do not add advice of your own.";

/// Summarizer that calls Bedrock's Converse API directly.
pub struct BedrockSummarizer {
    client: BedrockClient,
    model_id: String,
    chat: Arc<dyn ChatClient>,
    bot_identity: String,
    timeout: Duration,
}

impl BedrockSummarizer {
    /// `timeout` bounds each Converse call.
    pub fn new(
        client: BedrockClient,
        model_id: impl Into<String>,
        chat: Arc<dyn ChatClient>,
        bot_identity: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            chat,
            bot_identity: bot_identity.into(),
            timeout,
        }
    }
}

/// Render history as a plain transcript, labelling the bot as the assistant.
pub(crate) fn transcript(history: &[ChatMessage], bot_identity: &str) -> String {
    history
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| {
            let speaker = if m.author == bot_identity {
                "Assistant"
            } else {
                "User"
            };
            format!("{}: {}", speaker, m.content.trim())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Summarizer for BedrockSummarizer {
    async fn summarize(&self, chat_session_id: &str) -> Result<String> {
        let history = self.chat.history(chat_session_id).await?;
        let transcript = transcript(&history, &self.bot_identity);
        if transcript.is_empty() {
            return Err(Error::Validation(format!(
                "chat session {} has no messages to summarize",
                chat_session_id
            )));
        }

        info!(
            chat_session_id,
            messages = history.len(),
            model_id = %self.model_id,
            "Summarizing chat history"
        );

        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(transcript))
            .build()
            .map_err(|e| Error::Aws(format!("Failed to build Bedrock message: {}", e)))?;

        let request = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(SYSTEM_PROMPT.to_string()))
            .messages(message)
            .send();
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                Error::Aws(format!(
                    "Bedrock converse timed out after {}s",
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| Error::Aws(format!("Bedrock converse failed: {}", e)))?;

        let summary = response
            .output()
            .and_then(|output| output.as_message().ok())
            .map(|message| {
                message
                    .content()
                    .iter()
                    .filter_map(|block| block.as_text().ok())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if summary.trim().is_empty() {
            return Err(Error::Aws("Bedrock returned no summary text".to_string()));
        }
        Ok(summary.trim().to_string())
    }
}
