pub mod text;

// Re-export the chunking entry points for external use
pub use text::{
    DEFAULT_MAX_CHUNK_CHARS, SentenceChunker, TextChunk, normalize_whitespace, segment,
    split_sentences,
};
