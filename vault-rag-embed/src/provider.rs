//! Embedding provider implementations

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::transport::post_json;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Result of embedding generation
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text, in input order
    pub embeddings: Vec<Vec<f32>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result from a vector of embeddings.
    ///
    /// The dimension is inferred from the first embedding vector.
    /// If the embeddings vector is empty, dimension defaults to 0.
    pub fn new(embeddings: Vec<Vec<f32>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Returns the number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Trait for embedding providers that can generate embeddings from text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, one vector per input in the same position.
    ///
    /// The default implementation issues one [`embed_text`](Self::embed_text)
    /// call per text and stops at the first failure. Vectors must all share
    /// one dimensionality.
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        let started = Instant::now();
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

        for (idx, text) in texts.iter().enumerate() {
            let embedding = self.embed_text(text).await.inspect_err(|e| {
                tracing::error!("Embedding {} of {} failed: {}", idx + 1, texts.len(), e);
            })?;

            if let Some(first) = embeddings.first() {
                if first.len() != embedding.len() {
                    return Err(ServiceError::malformed(format!(
                        "embedding {idx} has dimension {}, expected {}",
                        embedding.len(),
                        first.len()
                    )));
                }
            }
            embeddings.push(embedding);
        }

        let result = EmbeddingResult::new(embeddings);
        tracing::info!(
            "{} generated {} embeddings of dimension {} in {:?}",
            self.provider_name(),
            result.len(),
            result.dimension,
            started.elapsed()
        );
        Ok(result)
    }

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_vector(self) -> Result<Vec<f32>> {
        if self.embedding.is_empty() {
            return Err(ServiceError::malformed("embedding vector is empty"));
        }
        if let Some(pos) = self.embedding.iter().position(|v| !v.is_finite()) {
            return Err(ServiceError::malformed(format!(
                "embedding component {pos} is not a finite number"
            )));
        }
        Ok(self.embedding)
    }
}

/// Embedding provider backed by an Ollama-compatible `/api/embeddings` endpoint.
///
/// Every text costs one round trip; nothing is cached.
#[derive(Debug, Clone)]
pub struct OllamaEmbedProvider {
    config: ServiceConfig,
    client: reqwest::Client,
    url: String,
}

impl OllamaEmbedProvider {
    /// Creates a provider for the configured embedding model.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = config.http_client()?;
        let url = config.endpoint("/api/embeddings");
        Ok(Self {
            config,
            client,
            url,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            prompt: text,
        };
        tracing::debug!(
            "Requesting embedding for {} characters from {}",
            text.chars().count(),
            self.config.embedding_model
        );
        let response: EmbeddingResponse = post_json(&self.client, &self.url, &request).await?;
        response.into_vector()
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}
