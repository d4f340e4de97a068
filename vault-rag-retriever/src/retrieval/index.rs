//! In-memory pairing of chunk texts with their embedding vectors.
//!
//! A [`DocumentIndex`] is only ever produced whole: [`DocumentIndex::build`]
//! either embeds every chunk or fails, so a partially embedded document can
//! never be observed. Each [`EmbeddedChunk`] carries its text and vector
//! together under an explicit ordinal.

use crate::error::{PipelineError, Result};
use serde::Serialize;
use tracing::{debug, info};
use vault_rag_embed::{EmbeddingProvider, ServiceError};

/// A chunk of document text together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedChunk {
    /// 0-based position of the chunk in the document
    pub ordinal: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Fully embedded document, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentIndex {
    entries: Vec<EmbeddedChunk>,
    dimension: usize,
}

impl DocumentIndex {
    /// Embed `chunks` in order and pair each chunk with its vector.
    ///
    /// Issues one embedding request per chunk through `provider`. Any failure
    /// discards the vectors produced so far.
    pub async fn build(chunks: Vec<String>, provider: &dyn EmbeddingProvider) -> Result<Self> {
        if chunks.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }

        debug!(
            "Embedding {} chunks with {}",
            chunks.len(),
            provider.provider_name()
        );
        let result = provider.embed_texts(&chunks).await?;

        if result.len() != chunks.len() {
            return Err(PipelineError::CountMismatch {
                chunks: chunks.len(),
                vectors: result.len(),
            });
        }

        let dimension = result.dimension;
        if let Some(pos) = result.embeddings.iter().position(|v| v.len() != dimension) {
            return Err(ServiceError::malformed(format!(
                "embedding {pos} has dimension {}, expected {dimension}",
                result.embeddings[pos].len()
            ))
            .into());
        }

        let entries: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(result.embeddings)
            .enumerate()
            .map(|(ordinal, (text, embedding))| EmbeddedChunk {
                ordinal,
                text,
                embedding,
            })
            .collect();

        info!(
            "Built document index with {} chunks of dimension {}",
            entries.len(),
            dimension
        );
        Ok(Self { entries, dimension })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality shared by every vector in the index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[EmbeddedChunk] {
        &self.entries
    }

    /// Chunk texts in document order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vault_rag_embed::EmbeddingResult;

    /// Embeds a text as `[len, 1.0]`.
    struct LengthEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed_text(&self, text: &str) -> vault_rag_embed::Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        fn provider_name(&self) -> &str {
            "length"
        }
    }

    /// Returns one vector fewer than requested.
    struct ShortBatchEmbedder;

    #[async_trait]
    impl EmbeddingProvider for ShortBatchEmbedder {
        async fn embed_text(&self, _text: &str) -> vault_rag_embed::Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn embed_texts(&self, texts: &[String]) -> vault_rag_embed::Result<EmbeddingResult> {
            Ok(EmbeddingResult::new(vec![vec![1.0]; texts.len() - 1]))
        }

        fn provider_name(&self) -> &str {
            "short"
        }
    }

    #[tokio::test]
    async fn test_build_pairs_chunks_with_vectors() {
        let chunks = vec!["a".to_string(), "bbb".to_string(), "cc".to_string()];
        let index = DocumentIndex::build(chunks, &LengthEmbedder).await.unwrap();

        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
        assert_eq!(index.dimension(), 2);
        assert_eq!(index.texts().collect::<Vec<_>>(), vec!["a", "bbb", "cc"]);
        for (pos, entry) in index.entries().iter().enumerate() {
            assert_eq!(entry.ordinal, pos);
            assert_eq!(entry.embedding[0], entry.text.len() as f32);
        }
    }

    #[tokio::test]
    async fn test_build_rejects_empty_corpus() {
        let err = DocumentIndex::build(Vec::new(), &LengthEmbedder)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyCorpus));
    }

    #[tokio::test]
    async fn test_build_rejects_count_mismatch() {
        let chunks = vec!["a".to_string(), "b".to_string()];
        let err = DocumentIndex::build(chunks, &ShortBatchEmbedder)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::CountMismatch {
                chunks: 2,
                vectors: 1
            }
        ));
    }
}
