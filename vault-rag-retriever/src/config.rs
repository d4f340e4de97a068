//! TOML configuration for the retrieval pipeline.
//!
//! ```toml
//! [chunking]
//! max_chunk_chars = 500
//!
//! [search]
//! top_k = 3
//! similarity_threshold = 0.5
//! enforce_threshold = false
//!
//! [service]
//! base_url = "http://127.0.0.1:11434"
//! embedding_model = "mxbai-embed-large"
//! chat_model = "llama3.2:3b"
//! request_timeout_secs = 120
//!
//! [storage]
//! vault_path = "vault.txt"
//! ```
//!
//! Every key is optional. The loaded value is immutable and handed to
//! components at construction.

use crate::error::{PipelineError, Result};
use crate::retrieval::ranker::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vault_rag_context::DEFAULT_MAX_CHUNK_CHARS;
use vault_rag_embed::ServiceConfig;
use vault_rag_embed::config::{
    DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_SYSTEM_PROMPT,
};

/// Default location of the flat chunk file.
pub const DEFAULT_VAULT_PATH: &str = "vault.txt";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RagConfig {
    pub chunking: ChunkingSection,
    pub search: SearchConfig,
    pub service: ServiceSection,
    pub storage: StorageSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChunkingSection {
    /// Upper bound on chunk length in characters
    pub max_chunk_chars: usize,
}

impl Default for ChunkingSection {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSection {
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub request_timeout_secs: u64,
    pub system_prompt: String,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            request_timeout_secs: 120,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    /// Flat chunk file; `None` keeps chunks in memory only
    pub vault_path: Option<PathBuf>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            vault_path: Some(PathBuf::from(DEFAULT_VAULT_PATH)),
        }
    }
}

impl RagConfig {
    /// Parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            PipelineError::invalid_config(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chunk_chars == 0 {
            return Err(PipelineError::invalid_config(
                "max_chunk_chars must be at least 1",
            ));
        }
        self.search.validate()?;
        self.service_config()
            .validate()
            .map_err(|e| PipelineError::invalid_config(e.to_string()))?;
        Ok(())
    }

    /// Connection settings for the model service clients
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::new(&self.service.base_url)
            .with_embedding_model(&self.service.embedding_model)
            .with_chat_model(&self.service.chat_model)
            .with_request_timeout(Duration::from_secs(self.service.request_timeout_secs))
            .with_system_prompt(&self.service.system_prompt)
    }

    pub fn vault_path(&self) -> Option<&Path> {
        self.storage.vault_path.as_deref()
    }

    /// In-memory configuration with no vault file (builder style)
    pub fn without_vault(self) -> Self {
        Self {
            storage: StorageSection { vault_path: None },
            ..self
        }
    }
}
