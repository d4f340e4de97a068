//! Storage layer for vault-rag-retriever
//!
//! Two small pieces of file I/O sit under the pipeline:
//!
//! - **[`VaultStore`]**: the flat content store. Chunks are written one per
//!   line, in document order, and the line position is the only link between
//!   a chunk and its embedding.
//! - **[`DocumentSource`]**: reads a plain-text document and normalizes its
//!   whitespace before chunking.
//!
//! Embeddings are never persisted; they are rebuilt from the vault on load.

use crate::error::{PipelineError, Result};
use std::io;
use std::path::Path;
use vault_rag_context::normalize_whitespace;

pub mod vault_store;

pub use vault_store::VaultStore;

/// Reads document text from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentSource;

impl DocumentSource {
    /// Read a UTF-8 text file and collapse its whitespace.
    ///
    /// A missing or unreadable file, or one without any text, is
    /// [`PipelineError::SourceUnavailable`].
    pub fn read_text(path: &Path) -> Result<String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::source_unavailable(path, e))?;

        let text = normalize_whitespace(&raw);
        if text.is_empty() {
            return Err(PipelineError::source_unavailable(
                path,
                io::Error::new(io::ErrorKind::InvalidData, "document contains no text"),
            ));
        }

        tracing::debug!(
            "Read {} characters from {}",
            text.chars().count(),
            path.display()
        );
        Ok(text)
    }
}
