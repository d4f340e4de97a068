use crate::error::{PipelineError, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Flat, newline-delimited chunk file.
///
/// Writes replace the whole file atomically: the new content goes to a
/// temporary file in the same directory which is then renamed over the old
/// one, so a reader sees either the previous vault or the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultStore {
    path: PathBuf,
}

impl VaultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the vault with `chunks`, one per line.
    ///
    /// Chunks must be non-empty and must not contain line breaks, otherwise
    /// reading the vault back would shift every following position.
    pub fn write_chunks(&self, chunks: &[String]) -> Result<()> {
        if let Some(pos) = chunks
            .iter()
            .position(|c| c.trim().is_empty() || c.contains(['\n', '\r']))
        {
            return Err(PipelineError::store(
                &self.path,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("chunk {pos} is blank or spans several lines"),
                ),
            ));
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| PipelineError::store(&self.path, e))?;

        let mut file = NamedTempFile::new_in(dir).map_err(|e| PipelineError::store(&self.path, e))?;
        for chunk in chunks {
            writeln!(file, "{chunk}").map_err(|e| PipelineError::store(&self.path, e))?;
        }
        file.as_file()
            .sync_all()
            .map_err(|e| PipelineError::store(&self.path, e))?;
        file.persist(&self.path)
            .map_err(|e| PipelineError::store(&self.path, e.error))?;

        info!("Wrote {} chunks to {}", chunks.len(), self.path.display());
        Ok(())
    }

    /// Read the chunks back in file order, skipping blank lines.
    pub fn read_chunks(&self) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| PipelineError::source_unavailable(&self.path, e))?;

        let chunks: Vec<String> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        debug!("Read {} chunks from {}", chunks.len(), self.path.display());
        Ok(chunks)
    }
}
