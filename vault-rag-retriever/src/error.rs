//! Error types for ingestion, storage and retrieval

use std::path::PathBuf;
use vault_rag_embed::ServiceError;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure of an ingestion or retrieval step.
///
/// Ingestion surfaces every variant to the caller and leaves the pipeline
/// unloaded. Per-query failures are folded into the answer text by
/// [`RagPipeline::answer`](crate::retrieval::pipeline::RagPipeline::answer).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The document or vault file could not be read, or held no text
    #[error("Source unavailable at {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The embedding or chat service failed
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Ingestion produced zero chunks
    #[error("Document produced no chunks")]
    EmptyCorpus,

    /// The vault file could not be written
    #[error("Vault store error at {}: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Chunks and embedding vectors disagree in number
    #[error("Embedding count mismatch: {chunks} chunks but {vectors} vectors")]
    CountMismatch { chunks: usize, vectors: usize },

    /// Configuration value out of range or unreadable
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl PipelineError {
    pub fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub fn store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Store {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
