//! Status snapshots for the pipeline, the model service and the vault.

use crate::storage::VaultStore;
use serde::{Deserialize, Serialize};
use vault_rag_embed::{ServiceConfig, ServiceManager};

/// Whether a document is available for retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// No embedded document; queries go to the chat service without context
    Unloaded,
    /// Chunks and embeddings present and consistent
    Loaded,
}

/// Snapshot of the retrieval pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub state: PipelineState,
    /// Number of embedded chunks (0 when unloaded)
    pub chunks: usize,
    /// Embedding dimensionality, if loaded
    pub dimension: Option<usize>,
    pub embedding_model: String,
    pub chat_model: String,
    pub top_k: usize,
    pub similarity_threshold: f32,
    /// Whether the threshold filters results
    pub enforce_threshold: bool,
    pub vault_path: Option<String>,
}

/// Reachability of the model service and the models it offers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub base_url: String,
    pub reachable: bool,
    /// Installed model names
    pub models: Vec<String>,
    pub embedding_model: String,
    pub embedding_model_installed: bool,
    pub chat_model: String,
    pub chat_model_installed: bool,
    /// Error message when the service could not be queried
    pub error: Option<String>,
}

impl ServiceStatus {
    /// Query the service for its installed models. Never fails; problems are
    /// reported in `error`.
    pub async fn probe(config: &ServiceConfig) -> Self {
        let mut status = Self {
            base_url: config.base_url.clone(),
            reachable: false,
            models: Vec::new(),
            embedding_model: config.embedding_model.clone(),
            embedding_model_installed: false,
            chat_model: config.chat_model.clone(),
            chat_model_installed: false,
            error: None,
        };

        let listed = match ServiceManager::new(config) {
            Ok(manager) => manager.list_models().await,
            Err(e) => Err(e),
        };

        match listed {
            Ok(models) => {
                status.reachable = true;
                status.models = models.into_iter().map(|m| m.name).collect();
                status.embedding_model_installed =
                    ServiceManager::model_listed(&status.models, &config.embedding_model);
                status.chat_model_installed =
                    ServiceManager::model_listed(&status.models, &config.chat_model);
            }
            Err(e) => {
                tracing::warn!("Model service at {} not available: {}", config.base_url, e);
                status.error = Some(e.to_string());
            }
        }
        status
    }
}

/// Summary of the flat chunk file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSummary {
    pub path: String,
    pub exists: bool,
    /// Number of stored chunks, if the vault could be read
    pub chunks: Option<usize>,
}

impl VaultSummary {
    pub fn inspect(store: &VaultStore) -> Self {
        let chunks = if store.exists() {
            store.read_chunks().ok().map(|chunks| chunks.len())
        } else {
            None
        };
        Self {
            path: store.path().display().to_string(),
            exists: store.exists(),
            chunks,
        }
    }
}
