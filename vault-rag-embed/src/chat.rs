//! Chat completion client
//!
//! A conversation is an ordered list of [`ChatMessage`]s. The retrieval
//! pipeline only ever sends two: the fixed system instruction and a user turn
//! carrying the question, optionally prefixed with retrieved context.

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::transport::post_json;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Trait for services that complete a conversation with a single reply
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the conversation and return the reply text verbatim
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Name of the model answering the conversation
    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

impl ChatResponse {
    fn into_reply(self) -> Result<String> {
        self.message
            .map(|message| message.content)
            .ok_or_else(|| ServiceError::malformed("chat response has no message"))
    }
}

/// Chat provider backed by an Ollama-compatible `/api/chat` endpoint (non-streaming).
#[derive(Debug, Clone)]
pub struct OllamaChatProvider {
    config: ServiceConfig,
    client: reqwest::Client,
    url: String,
}

impl OllamaChatProvider {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = config.http_client()?;
        let url = config.endpoint("/api/chat");
        Ok(Self {
            config,
            client,
            url,
        })
    }
}

#[async_trait]
impl ChatProvider for OllamaChatProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.chat_model,
            messages,
            stream: false,
        };
        tracing::debug!(
            "Sending {} messages to chat model {}",
            messages.len(),
            self.config.chat_model
        );

        let response: ChatResponse = post_json(&self.client, &self.url, &request).await?;
        response.into_reply()
    }

    fn model_name(&self) -> &str {
        &self.config.chat_model
    }
}
