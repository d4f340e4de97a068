//! This module turns already-extracted document text into retrievable units
//! for a RAG (Retrieval Augmented Generation) pipeline.
//!
//! The text is expected to be whitespace-normalized: every run of whitespace
//! collapsed into a single space and the ends trimmed. [`normalize_whitespace`]
//! performs exactly that normalization for callers holding raw text.
//!
//! The module defines two main structs:
//! - [`SentenceChunker`]: Holds the character bound and performs the greedy
//!   sentence accumulation.
//! - [`TextChunk`]: A single finished chunk together with its position in the
//!   document.
//!
//! # Sentence Boundaries
//!
//! A sentence ends at `.`, `!` or `?` followed by whitespace. The terminator
//! stays attached to the sentence; the whitespace after it is consumed.
//!
//! # Chunk Bounds
//!
//! Sentences are appended to a running buffer (each followed by one space) as
//! long as the buffer stays strictly below `max_chunk_chars` characters. When the
//! next sentence would reach or exceed the bound, the buffer is closed, trimmed
//! and emitted, and the sentence starts a new buffer. Chunk boundaries therefore
//! always fall between sentences. A single sentence longer than the bound is
//! never truncated: it becomes a chunk on its own.
//!
//! Lengths are counted in characters (Unicode scalar values), not bytes.
//!
//! # Usage
//!
//! ```
//! use vault_rag_context::text::{SentenceChunker, TextChunk};
//!
//! let chunker = SentenceChunker::new(30);
//! let chunks: Vec<TextChunk> =
//!     chunker.get_chunks("Cats are mammals. Dogs are mammals too. Fish live in water.");
//!
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(chunks[0].sequence, 0);
//! assert_eq!(chunks[0].chunk_text, "Cats are mammals.");
//! assert_eq!(chunks[2].chunk_text, "Fish live in water.");
//! ```
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Default upper bound for a chunk, in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 500;

/// Sentence terminator followed by the whitespace that separates it from the next sentence.
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid"));

/// Any run of whitespace, used for normalization.
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Collapses every whitespace run into a single space and trims both ends.
///
/// # Examples
/// ```
/// use vault_rag_context::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  Page one.\n\n\tPage   two. "), "Page one. Page two.");
/// ```
pub fn normalize_whitespace(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw, " ").trim().to_string()
}

/// Splits text into sentences using the `[.!?]` + whitespace rule.
///
/// Terminators stay attached to their sentence. Empty sentences are dropped,
/// so an empty or whitespace-only input yields no sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for mat in SENTENCE_BOUNDARY.find_iter(text) {
        // Terminators are single-byte ASCII, so `start() + 1` is a char boundary.
        push_sentence(&mut sentences, &text[start..mat.start() + 1]);
        start = mat.end();
    }
    if start < text.len() {
        push_sentence(&mut sentences, &text[start..]);
    }

    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let sentence = candidate.trim();
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

/// Splits `text` into sentence-aligned chunks bounded by `max_chunk_chars`.
///
/// This is the plain-string form of [`SentenceChunker::get_chunks`].
pub fn segment(text: &str, max_chunk_chars: usize) -> Vec<String> {
    SentenceChunker::new(max_chunk_chars)
        .get_chunks(text)
        .into_iter()
        .map(|chunk| chunk.chunk_text)
        .collect()
}

/// Greedy sentence accumulator with a fixed character bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceChunker {
    max_chunk_chars: usize,
}

/// A finished chunk. Its only identity is its position in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// Position of this chunk in the document (0-indexed).
    pub sequence: usize,
    /// The chunk text, trimmed of surrounding whitespace.
    pub chunk_text: String,
}

impl TextChunk {
    /// Length of the chunk in characters.
    pub fn char_len(&self) -> usize {
        self.chunk_text.chars().count()
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

impl SentenceChunker {
    /// Creates a chunker that closes a chunk before it reaches `max_chunk_chars` characters.
    pub fn new(max_chunk_chars: usize) -> Self {
        Self { max_chunk_chars }
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    /// Splits `text` into an ordered sequence of [`TextChunk`]s.
    ///
    /// The output is a pure function of the input and the bound. Joining the
    /// returned chunks with single spaces yields the sentences of `text` in
    /// order, none dropped or duplicated.
    ///
    /// # Examples
    ///
    /// ```
    /// use vault_rag_context::text::SentenceChunker;
    ///
    /// let chunker = SentenceChunker::new(10);
    /// let chunks = chunker.get_chunks("This sentence is far longer than ten characters. Short.");
    ///
    /// // The oversized sentence stands alone instead of being truncated.
    /// assert_eq!(chunks[0].chunk_text, "This sentence is far longer than ten characters.");
    /// assert_eq!(chunks[1].chunk_text, "Short.");
    /// ```
    pub fn get_chunks(&self, text: &str) -> Vec<TextChunk> {
        let mut chunks: Vec<TextChunk> = Vec::new();
        let mut buffer = String::new();
        let mut buffer_chars = 0;

        for sentence in split_sentences(text) {
            let sentence_chars = sentence.chars().count();

            if buffer_chars + sentence_chars < self.max_chunk_chars {
                buffer.push_str(sentence);
                buffer.push(' ');
                buffer_chars += sentence_chars + 1;
            } else {
                Self::close_buffer(&mut chunks, &buffer);
                buffer.clear();
                buffer.push_str(sentence);
                buffer.push(' ');
                buffer_chars = sentence_chars + 1;
            }
        }

        Self::close_buffer(&mut chunks, &buffer);
        chunks
    }

    // An empty buffer is only closed when the very first sentence is oversized;
    // it must not turn into an empty chunk.
    fn close_buffer(chunks: &mut Vec<TextChunk>, buffer: &str) {
        let chunk_text = buffer.trim();
        if chunk_text.is_empty() {
            return;
        }
        chunks.push(TextChunk {
            sequence: chunks.len(),
            chunk_text: chunk_text.to_string(),
        });
    }
}
