//! Model service discovery.
//!
//! Lists the models installed on an Ollama-compatible service through
//! `/api/tags` and matches configured model names against them. A name
//! without a tag matches any installed tag of that model.

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::transport::get_json;
use serde::{Deserialize, Serialize};

/// Model installed on the service, as reported by `/api/tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier, e.g. `llama3.2:3b`
    pub name: String,
    /// Size of the model in bytes
    #[serde(default)]
    pub size: u64,
    /// Timestamp of last modification
    #[serde(default)]
    pub modified_at: String,
}

#[derive(Debug, Deserialize)]
struct ModelListResponse {
    models: Vec<ModelInfo>,
}

/// Reachability and model discovery for the model service
#[derive(Debug, Clone)]
pub struct ServiceManager {
    client: reqwest::Client,
    url: String,
}

impl ServiceManager {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            url: config.endpoint("/api/tags"),
        })
    }

    /// Check if the service answers at all
    pub async fn is_available(&self) -> bool {
        match self.list_models().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Model service not available: {}", e);
                false
            }
        }
    }

    /// List installed models
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let list: ModelListResponse = get_json(&self.client, &self.url).await?;
        Ok(list.models)
    }

    /// Check if a specific model is installed.
    ///
    /// A name without a tag (`mxbai-embed-large`) matches any tag of that model.
    pub async fn has_model(&self, model_name: &str) -> Result<bool> {
        let names: Vec<String> = self.list_models().await?.into_iter().map(|m| m.name).collect();
        Ok(Self::model_listed(&names, model_name))
    }

    /// Check a list of installed names the same way [`has_model`](Self::has_model) does
    pub fn model_listed(installed: &[String], model_name: &str) -> bool {
        installed.iter().any(|name| model_matches(name, model_name))
    }
}

fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || installed
            .strip_prefix(wanted)
            .is_some_and(|tag| tag.starts_with(':') && !wanted.contains(':'))
}
