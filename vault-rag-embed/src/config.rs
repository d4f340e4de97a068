//! Configuration for the external model service

use crate::error::{Result, ServiceError};
use std::time::Duration;

/// Default address of a local Ollama-compatible model service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "mxbai-embed-large";
/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "llama3.2:3b";
/// Fixed system instruction sent with every chat turn.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an expert at answering question using relevant text.";
/// Default client-side timeout for a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings shared by the embedding and chat clients.
///
/// The value is immutable once handed to a client; every client keeps its own clone.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Base URL of the service, e.g. `http://127.0.0.1:11434`
    pub base_url: String,
    /// Model used for `/api/embeddings`
    pub embedding_model: String,
    /// Model used for `/api/chat`
    pub chat_model: String,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// System instruction placed first in every conversation
    pub system_prompt: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Create a configuration pointing at `base_url` with default models.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the embedding model (builder style)
    pub fn with_embedding_model(self, model: impl Into<String>) -> Self {
        Self {
            embedding_model: model.into(),
            ..self
        }
    }

    /// Set the chat model (builder style)
    pub fn with_chat_model(self, model: impl Into<String>) -> Self {
        Self {
            chat_model: model.into(),
            ..self
        }
    }

    /// Set the per-request timeout (builder style)
    pub fn with_request_timeout(self, request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            ..self
        }
    }

    /// Set the system instruction (builder style)
    pub fn with_system_prompt(self, system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            ..self
        }
    }

    /// Full URL of an API endpoint such as `/api/embeddings`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Check that the configuration can be used to build a client.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            ServiceError::invalid_config(format!("base URL '{}' is invalid: {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ServiceError::invalid_config(format!(
                "base URL '{}' must use http or https",
                self.base_url
            )));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(ServiceError::invalid_config("embedding model name is empty"));
        }
        if self.chat_model.trim().is_empty() {
            return Err(ServiceError::invalid_config("chat model name is empty"));
        }
        if self.request_timeout.is_zero() {
            return Err(ServiceError::invalid_config("request timeout must be non-zero"));
        }

        tracing::debug!("Service configuration valid for {}", self.base_url);
        Ok(())
    }

    /// Build an HTTP client honouring the configured timeout.
    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        self.validate()?;
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ServiceError::invalid_config(format!("cannot build HTTP client: {e}")))
    }
}
