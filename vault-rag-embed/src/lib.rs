//! # vault-rag-embed
//!
//! Typed clients for the external model service used by the vault-rag pipeline.
//! The service is any Ollama-compatible HTTP endpoint; the pipeline treats it as
//! an opaque collaborator with a fixed request/response contract.
//!
//! ## Features
//!
//! - **Embeddings**: `POST /api/embeddings` with `{model, prompt}`, one request per text
//! - **Chat**: `POST /api/chat` with `{model, messages, stream: false}`
//! - **Discovery**: `GET /api/tags` to check reachability and installed models
//! - **Validation**: malformed or inconsistent responses become [`ServiceError`]s
//!   at the boundary, never panics deeper in the pipeline
//!
//! ## Quick Start
//!
//! ```no_run
//! use vault_rag_embed::{EmbeddingProvider, OllamaEmbedProvider, ServiceConfig};
//!
//! # async fn example() -> vault_rag_embed::Result<()> {
//! let provider = OllamaEmbedProvider::new(ServiceConfig::default())?;
//!
//! let texts = vec!["Hello world".to_string(), "How are you?".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//!
//! println!("Generated {} embeddings of dimension {}",
//!          result.len(), result.dimension);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`config`]: Service address, model names, timeout and system instruction
//! - [`provider`]: Embedding provider trait and the HTTP implementation
//! - [`chat`]: Chat provider trait, message types and the HTTP implementation
//! - [`manager`]: Service reachability and model listing
//! - [`error`]: Error types and result handling
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] using the crate's [`ServiceError`] type.
//! The clients never retry; callers decide how to react.

pub mod chat;
pub mod config;
pub mod error;
pub mod manager;
pub mod provider;
mod transport;

#[cfg(test)]
mod test_util;

// Re-export main types for easy access
pub use chat::{ChatMessage, ChatProvider, OllamaChatProvider, Role};
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use manager::{ModelInfo, ServiceManager};
pub use provider::{EmbeddingProvider, EmbeddingResult, OllamaEmbedProvider};
