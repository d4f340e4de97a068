//! vault-rag-retriever: Retrieval-augmented question answering over a single document
//!
//! This crate turns one document into a small, fully in-memory semantic index and
//! uses it to ground answers from a chat model. Chunk text is kept in a flat
//! "vault" file; embeddings are rebuilt from it on every load.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: Document index, similarity ranker and the orchestrating pipeline
//! - **[`storage`]**: Flat chunk vault and plain-text document source
//! - **[`config`]**: TOML configuration
//! - **[`status`]**: Pipeline, model service and vault snapshots
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vault_rag_embed::{OllamaChatProvider, OllamaEmbedProvider};
//! use vault_rag_retriever::{config::RagConfig, retrieval::pipeline::RagPipeline};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RagConfig::default();
//! let embedder = Arc::new(OllamaEmbedProvider::new(config.service_config())?);
//! let chat = Arc::new(OllamaChatProvider::new(config.service_config())?);
//!
//! let pipeline = RagPipeline::new(config, embedder, chat)?;
//! pipeline.ingest_file("notes.txt".as_ref()).await?;
//! println!("{}", pipeline.answer("What are cats?").await);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Document → Chunker → Vault → Embeddings → DocumentIndex
//!                                               ↓
//! Query → Embedding → Ranker ← ─ ─ ─ ─ ─ ─ ─ ─ ─┘
//!                       ↓
//!              Context + Query → Chat → Answer
//! ```

pub mod config;
pub mod error;
pub mod retrieval;
pub mod status;
pub mod storage;

pub use error::{PipelineError, Result};
