//! Retrieval orchestrator tying chunking, embedding, ranking and chat together.
//!
//! ## Lifecycle
//!
//! ```text
//! text → normalize → SentenceChunker → VaultStore (write, re-read) → DocumentIndex::build
//!                                                                          ↓
//!                                              RwLock<Option<Arc<DocumentIndex>>> (swap)
//!                                                                          ↓
//! query → embed → rank → context block → [system, user] → ChatProvider → reply
//! ```
//!
//! The pipeline is either **Unloaded** (no index) or **Loaded**. Ingestion
//! builds a complete new index before publishing it with a single reference
//! swap, so a concurrent query sees the old document or the new one, never a
//! mix. Ingestions are serialized. A failed ingestion leaves the pipeline
//! Unloaded.
//!
//! Per-query failures never escape [`RagPipeline::answer`]: they are returned
//! as the answer text so an interactive session keeps going.

use crate::config::RagConfig;
use crate::error::{PipelineError, Result};
use crate::retrieval::index::DocumentIndex;
use crate::retrieval::ranker::{ScoredChunk, rank};
use crate::status::{PipelineState, PipelineStatus};
use crate::storage::{DocumentSource, VaultStore};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use vault_rag_context::{SentenceChunker, normalize_whitespace};
use vault_rag_embed::{ChatMessage, ChatProvider, EmbeddingProvider};

/// Outcome of a successful ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of chunks embedded
    pub chunks: usize,
    /// Embedding dimensionality
    pub dimension: usize,
    pub elapsed: Duration,
}

/// Reply from the chat service together with the context that grounded it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub reply: String,
    /// Retrieved chunks joined by newlines, if any were found
    pub context: Option<String>,
}

pub struct RagPipeline {
    config: RagConfig,
    chunker: SentenceChunker,
    vault: Option<VaultStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatProvider>,
    index: RwLock<Option<Arc<DocumentIndex>>>,
    ingest_lock: Mutex<()>,
}

impl RagPipeline {
    /// Create an unloaded pipeline. The configuration is validated here and
    /// never changes afterwards.
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let chunker = SentenceChunker::new(config.chunking.max_chunk_chars);
        let vault = config.vault_path().map(VaultStore::new);

        Ok(Self {
            config,
            chunker,
            vault,
            embedder,
            chat,
            index: RwLock::new(None),
            ingest_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn vault(&self) -> Option<&VaultStore> {
        self.vault.as_ref()
    }

    /// Current index, if loaded. The snapshot stays valid across later ingestions.
    pub async fn index(&self) -> Option<Arc<DocumentIndex>> {
        self.index.read().await.clone()
    }

    pub async fn state(&self) -> PipelineState {
        if self.index.read().await.is_some() {
            PipelineState::Loaded
        } else {
            PipelineState::Unloaded
        }
    }

    /// Chunk, persist and embed already extracted document text.
    pub async fn ingest_text(&self, text: &str) -> Result<IngestReport> {
        self.replace_index(self.build_from_text(text)).await
    }

    /// Read a plain-text document and ingest it.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        self.replace_index(async {
            let text = DocumentSource::read_text(path)?;
            self.build_from_text(&text).await
        })
        .await
    }

    /// Re-embed the chunks already stored in the vault, without re-chunking.
    pub async fn load_vault(&self) -> Result<IngestReport> {
        self.replace_index(async {
            let vault = self
                .vault
                .as_ref()
                .ok_or_else(|| PipelineError::invalid_config("no vault path configured"))?;
            let chunks = vault.read_chunks()?;
            info!(
                "Loaded {} chunks from {}",
                chunks.len(),
                vault.path().display()
            );
            DocumentIndex::build(chunks, self.embedder.as_ref()).await
        })
        .await
    }

    /// Chunks most similar to `query`, best first. Empty when unloaded.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let Some(index) = self.index().await else {
            debug!("No document loaded, skipping retrieval");
            return Ok(Vec::new());
        };

        let query_vector = self.embedder.embed_text(query).await?;
        if query_vector.len() != index.dimension() {
            warn!(
                "Query embedding has dimension {}, index has {}",
                query_vector.len(),
                index.dimension()
            );
        }

        let results = rank(&query_vector, index.entries(), &self.config.search);
        debug!("Retrieved {} chunks for query", results.len());
        Ok(results)
    }

    /// The system instruction followed by a user turn of `context\nquery`, or
    /// the bare query when there is no context.
    pub fn build_messages(&self, query: &str, context: Option<&str>) -> Vec<ChatMessage> {
        let user_content = match context {
            Some(context) if !context.is_empty() => format!("{context}\n{query}"),
            _ => query.to_string(),
        };
        vec![
            ChatMessage::system(&self.config.service.system_prompt),
            ChatMessage::user(user_content),
        ]
    }

    /// Answer `query` and return the reply text.
    ///
    /// Service failures come back as the reply, prefixed with
    /// `Error retrieving context:` or `Error generating response:`.
    pub async fn answer(&self, query: &str) -> String {
        self.answer_with_context(query).await.reply
    }

    /// Like [`answer`](Self::answer), also returning the context block that was sent.
    pub async fn answer_with_context(&self, query: &str) -> Answer {
        let context = match self.retrieve(query).await {
            Ok(chunks) if chunks.is_empty() => None,
            Ok(chunks) => Some(
                chunks
                    .iter()
                    .map(|chunk| chunk.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Err(e) => {
                warn!("Context retrieval failed: {}", e);
                return Answer {
                    reply: format!("Error retrieving context: {e}"),
                    context: None,
                };
            }
        };

        let messages = self.build_messages(query, context.as_deref());
        let reply = match self.chat.chat(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat request failed: {}", e);
                format!("Error generating response: {e}")
            }
        };

        Answer { reply, context }
    }

    pub async fn status(&self) -> PipelineStatus {
        let index = self.index().await;
        PipelineStatus {
            state: if index.is_some() {
                PipelineState::Loaded
            } else {
                PipelineState::Unloaded
            },
            chunks: index.as_ref().map_or(0, |index| index.len()),
            dimension: index.as_ref().map(|index| index.dimension()),
            embedding_model: self.config.service.embedding_model.clone(),
            chat_model: self.chat.model_name().to_string(),
            top_k: self.config.search.top_k,
            similarity_threshold: self.config.search.similarity_threshold,
            enforce_threshold: self.config.search.enforce_threshold,
            vault_path: self
                .vault
                .as_ref()
                .map(|vault| vault.path().display().to_string()),
        }
    }

    async fn build_from_text(&self, text: &str) -> Result<DocumentIndex> {
        let normalized = normalize_whitespace(text);
        let mut chunks: Vec<String> = self
            .chunker
            .get_chunks(&normalized)
            .into_iter()
            .map(|chunk| chunk.chunk_text)
            .collect();
        if chunks.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }
        info!("Split document into {} chunks", chunks.len());

        // The vault is the authoritative chunk order
        if let Some(vault) = &self.vault {
            vault.write_chunks(&chunks)?;
            chunks = vault.read_chunks()?;
        }

        DocumentIndex::build(chunks, self.embedder.as_ref()).await
    }

    /// Run `build` under the ingestion lock and publish its result.
    async fn replace_index<F>(&self, build: F) -> Result<IngestReport>
    where
        F: Future<Output = Result<DocumentIndex>>,
    {
        let _guard = self.ingest_lock.lock().await;
        let started = Instant::now();

        match build.await {
            Ok(index) => {
                let report = IngestReport {
                    chunks: index.len(),
                    dimension: index.dimension(),
                    elapsed: started.elapsed(),
                };
                *self.index.write().await = Some(Arc::new(index));
                info!(
                    "Ingestion complete: {} chunks of dimension {} in {:?}",
                    report.chunks, report.dimension, report.elapsed
                );
                Ok(report)
            }
            Err(e) => {
                *self.index.write().await = None;
                warn!("Ingestion failed, pipeline unloaded: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tracing_test::traced_test;
    use vault_rag_embed::{Role, ServiceError};

    /// Embeds text by the vowels it contains.
    struct VowelEmbedder;

    #[async_trait]
    impl EmbeddingProvider for VowelEmbedder {
        async fn embed_text(&self, text: &str) -> vault_rag_embed::Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok("aeiou"
                .chars()
                .map(|v| lower.matches(v).count() as f32)
                .collect())
        }

        fn provider_name(&self) -> &str {
            "vowels"
        }
    }

    struct RecordingChat {
        reply: Option<String>,
        seen: StdMutex<Vec<Vec<ChatMessage>>>,
    }

    impl RecordingChat {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                seen: StdMutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                seen: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for RecordingChat {
        async fn chat(&self, messages: &[ChatMessage]) -> vault_rag_embed::Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.reply
                .clone()
                .ok_or_else(|| ServiceError::malformed("chat response has no message"))
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn pipeline(chat: Arc<RecordingChat>) -> RagPipeline {
        RagPipeline::new(
            RagConfig::default().without_vault(),
            Arc::new(VowelEmbedder),
            chat,
        )
        .unwrap()
    }

    #[test]
    fn test_build_messages() {
        let pipeline = pipeline(Arc::new(RecordingChat::replying("ok")));

        let messages = pipeline.build_messages("What are cats?", Some("Cats are mammals."));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(
            messages[0].content,
            "You are an expert at answering question using relevant text."
        );
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Cats are mammals.\nWhat are cats?");

        let bare = pipeline.build_messages("What are cats?", None);
        assert_eq!(bare[1].content, "What are cats?");
    }

    #[tokio::test]
    async fn test_unloaded_pipeline_answers_without_context() {
        let chat = Arc::new(RecordingChat::replying("No idea."));
        let pipeline = pipeline(Arc::clone(&chat));

        assert_eq!(pipeline.state().await, PipelineState::Unloaded);
        assert!(pipeline.retrieve("anything").await.unwrap().is_empty());

        let answer = pipeline.answer_with_context("What are cats?").await;
        assert_eq!(answer.reply, "No idea.");
        assert_eq!(answer.context, None);

        let seen = chat.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0][1].content, "What are cats?");
    }

    #[tokio::test]
    async fn test_ingest_then_answer_with_context() {
        let chat = Arc::new(RecordingChat::replying("Cats are mammals."));
        let pipeline = pipeline(Arc::clone(&chat));

        let report = pipeline
            .ingest_text("Cats are mammals. Dogs are mammals too. Fish live in water.")
            .await
            .unwrap();
        assert_eq!(report.chunks, 1);
        assert_eq!(report.dimension, 5);
        assert_eq!(pipeline.state().await, PipelineState::Loaded);

        let answer = pipeline.answer_with_context("What are cats?").await;
        assert_eq!(answer.reply, "Cats are mammals.");
        let context = answer.context.unwrap();
        assert_eq!(
            context,
            "Cats are mammals. Dogs are mammals too. Fish live in water."
        );

        let seen = chat.seen.lock().unwrap();
        assert_eq!(seen[0][1].content, format!("{context}\nWhat are cats?"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_chat_failure_becomes_answer_text() {
        let pipeline = pipeline(Arc::new(RecordingChat::failing()));
        pipeline.ingest_text("Cats are mammals.").await.unwrap();

        let reply = pipeline.answer("What are cats?").await;
        assert_eq!(
            reply,
            "Error generating response: Malformed response from model service: chat response has no message"
        );
        assert!(logs_contain("Chat request failed"));
    }

    #[tokio::test]
    async fn test_empty_document_is_empty_corpus() {
        let pipeline = pipeline(Arc::new(RecordingChat::replying("ok")));

        let err = pipeline.ingest_text("   \n\t  ").await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyCorpus));
        assert_eq!(pipeline.state().await, PipelineState::Unloaded);
    }

    #[tokio::test]
    async fn test_load_vault_requires_vault_path() {
        let pipeline = pipeline(Arc::new(RecordingChat::replying("ok")));

        let err = pipeline.load_vault().await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_status_reflects_state() {
        let pipeline = pipeline(Arc::new(RecordingChat::replying("ok")));

        let status = pipeline.status().await;
        assert_eq!(status.state, PipelineState::Unloaded);
        assert_eq!(status.chunks, 0);
        assert_eq!(status.dimension, None);
        assert_eq!(status.chat_model, "recording");
        assert_eq!(status.vault_path, None);

        pipeline.ingest_text("Cats are mammals.").await.unwrap();
        let status = pipeline.status().await;
        assert_eq!(status.state, PipelineState::Loaded);
        assert_eq!(status.chunks, 1);
        assert_eq!(status.dimension, Some(5));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = RagConfig::default().without_vault();
        config.search.top_k = 0;

        let result = RagPipeline::new(
            config,
            Arc::new(VowelEmbedder),
            Arc::new(RecordingChat::replying("ok")),
        );
        assert!(matches!(result, Err(PipelineError::InvalidConfig { .. })));
    }
}
