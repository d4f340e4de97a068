//! Cosine-similarity ranking over an embedded document.
//!
//! Scoring is exhaustive: every stored vector is compared with the query, so
//! the cost is linear in the number of chunks. Vectors with zero magnitude (or
//! of a different dimensionality than the query) have no defined score and are
//! left out of the results entirely.
//!
//! Results are ordered best-first with a stable sort, so two chunks with
//! exactly equal scores keep their document order.

use crate::error::{PipelineError, Result};
use crate::retrieval::index::EmbeddedChunk;
use serde::{Deserialize, Serialize};

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 3;
/// Default minimum score, applied only when `enforce_threshold` is set.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Parameters for a single ranking pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Maximum number of chunks to return (at least 1)
    pub top_k: usize,
    /// Minimum acceptable score in [-1, 1]
    pub similarity_threshold: f32,
    /// Drop chunks scoring below `similarity_threshold` before truncating to `top_k`
    pub enforce_threshold: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            enforce_threshold: false,
        }
    }
}

impl SearchConfig {
    pub fn new(top_k: usize) -> Result<Self> {
        let config = Self {
            top_k,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Filter results below `threshold` (builder style)
    pub fn with_enforced_threshold(self, threshold: f32) -> Self {
        Self {
            similarity_threshold: threshold,
            enforce_threshold: true,
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(PipelineError::invalid_config("top_k must be at least 1"));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(PipelineError::invalid_config(format!(
                "similarity_threshold {} is outside [-1, 1]",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// A chunk selected for a query, with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    /// Position of the chunk in the document
    pub ordinal: usize,
    /// Chunk text, trimmed
    pub text: String,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Cosine similarity between two vectors.
///
/// Returns `None` when the vectors differ in length, either has zero
/// magnitude, or the result is not a finite number.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    // Accumulate in f64 so squaring large finite components cannot overflow
    let dot_product: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let score = (dot_product / (norm_a * norm_b)) as f32;
    score.is_finite().then_some(score)
}

/// Rank embedded chunks against a query vector.
pub fn rank(query: &[f32], entries: &[EmbeddedChunk], config: &SearchConfig) -> Vec<ScoredChunk> {
    let vectors = entries.iter().map(|entry| entry.embedding.as_slice());
    top_scores(query, vectors, config)
        .into_iter()
        .map(|(idx, score)| {
            let entry = &entries[idx];
            ScoredChunk {
                ordinal: entry.ordinal,
                text: entry.text.trim().to_string(),
                score,
            }
        })
        .collect()
}

/// Rank parallel arrays of vectors and chunk texts, returning the best texts.
///
/// `matrix[i]` must be the embedding of `content[i]`; arrays of different
/// length are rejected rather than zipped.
pub fn rank_texts(
    query: &[f32],
    matrix: &[Vec<f32>],
    content: &[String],
    config: &SearchConfig,
) -> Result<Vec<String>> {
    if matrix.len() != content.len() {
        return Err(PipelineError::CountMismatch {
            chunks: content.len(),
            vectors: matrix.len(),
        });
    }

    let vectors = matrix.iter().map(Vec::as_slice);
    Ok(top_scores(query, vectors, config)
        .into_iter()
        .map(|(idx, _)| content[idx].trim().to_string())
        .collect())
}

/// Positions and scores of the best vectors, best first.
fn top_scores<'a>(
    query: &[f32],
    vectors: impl Iterator<Item = &'a [f32]>,
    config: &SearchConfig,
) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = vectors
        .enumerate()
        .filter_map(|(idx, vector)| cosine_similarity(query, vector).map(|score| (idx, score)))
        .filter(|(_, score)| !config.enforce_threshold || *score >= config.similarity_threshold)
        .collect();

    // sort_by is stable: equal scores keep ascending position
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(config.top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ordinal: usize, text: &str, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            ordinal,
            text: text.to_string(),
            embedding,
        }
    }

    fn sample_entries() -> Vec<EmbeddedChunk> {
        vec![
            entry(0, "Cats are mammals.", vec![1.0, 0.0, 0.0]),
            entry(1, "Dogs are mammals too.", vec![0.8, 0.6, 0.0]),
            entry(2, " Fish live in water. ", vec![0.0, 0.0, 1.0]),
            entry(3, "Birds can fly.", vec![0.0, 1.0, 0.0]),
        ]
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let c = vec![1.0, 0.0, 0.0];
        let d = vec![-1.0, 0.0, 0.0];

        assert!((cosine_similarity(&a, &b).unwrap() - 0.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &c).unwrap() - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &d).unwrap() - (-1.0)).abs() < 1e-6);

        let scaled = vec![3.0, 4.0];
        let unit = vec![0.6, 0.8];
        assert!((cosine_similarity(&scaled, &unit).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_undefined() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]), None);
    }

    #[test]
    fn test_cosine_similarity_large_components() {
        let score = cosine_similarity(&[1e20, 0.0], &[1.0, 0.0]).unwrap();
        assert!((score - 1.0).abs() < 1e-6);

        let score = cosine_similarity(&[f32::MAX, f32::MAX], &[1.0, 1.0]).unwrap();
        assert!((score - 1.0).abs() < 1e-6);

        let score = cosine_similarity(&[1e-30, 1e-30], &[-1.0, -1.0]).unwrap();
        assert!((score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rank_best_first() {
        let entries = sample_entries();
        let config = SearchConfig::default();

        let results = rank(&[1.0, 0.1, 0.0], &entries, &config);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].ordinal, 0);
        assert_eq!(results[1].ordinal, 1);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_identical_vector_ranks_first_with_score_one() {
        let entries = sample_entries();
        let config = SearchConfig::new(1).unwrap();

        let results = rank(&[0.0, 0.0, 1.0], &entries, &config);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ordinal, 2);
        assert_eq!(results[0].text, "Fish live in water.");
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_result_count_bounded_by_top_k_and_chunks() {
        let entries = sample_entries();

        let config = SearchConfig::new(10).unwrap();
        assert_eq!(rank(&[1.0, 1.0, 1.0], &entries, &config).len(), 4);

        let config = SearchConfig::new(2).unwrap();
        assert_eq!(rank(&[1.0, 1.0, 1.0], &entries, &config).len(), 2);

        assert!(rank(&[1.0, 1.0, 1.0], &[], &config).is_empty());
    }

    #[test]
    fn test_ties_keep_document_order() {
        let entries = vec![
            entry(0, "first", vec![0.0, 1.0]),
            entry(1, "second", vec![1.0, 0.0]),
            entry(2, "third", vec![1.0, 0.0]),
            entry(3, "fourth", vec![2.0, 0.0]),
        ];
        let config = SearchConfig::new(3).unwrap();

        let results = rank(&[1.0, 0.0], &entries, &config);
        let ordinals: Vec<usize> = results.iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_vector_never_ranked() {
        let entries = vec![
            entry(0, "degenerate", vec![0.0, 0.0, 0.0]),
            entry(1, "real", vec![0.0, 1.0, 0.0]),
        ];
        let config = SearchConfig::new(5).unwrap();

        for query in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-1.0, -1.0, -1.0]] {
            let results = rank(&query, &entries, &config);
            assert!(results.iter().all(|r| r.text != "degenerate"));
            assert_eq!(results.len(), 1);
        }

        assert!(rank(&[0.0, 0.0, 0.0], &entries, &config).is_empty());
    }

    #[test]
    fn test_threshold_ignored_by_default() {
        let entries = sample_entries();
        let config = SearchConfig::default();

        // Orthogonal to everything except ordinal 2, yet three results come back
        let results = rank(&[0.0, 0.0, 1.0], &entries, &config);
        assert_eq!(results.len(), 3);
        assert!(results[1].score < config.similarity_threshold);
    }

    #[test]
    fn test_threshold_enforced_when_requested() {
        let entries = sample_entries();
        let config = SearchConfig::default().with_enforced_threshold(0.5);

        let results = rank(&[1.0, 0.0, 0.0], &entries, &config);
        let ordinals: Vec<usize> = results.iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);
    }

    #[test]
    fn test_rank_texts_parallel_arrays() {
        let matrix = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]];
        let content = vec![
            "alpha".to_string(),
            "  beta  ".to_string(),
            "gamma".to_string(),
        ];
        let config = SearchConfig::new(2).unwrap();

        let texts = rank_texts(&[0.0, 1.0], &matrix, &content, &config).unwrap();
        assert_eq!(texts, vec!["beta".to_string(), "gamma".to_string()]);
    }

    #[test]
    fn test_rank_texts_rejects_length_mismatch() {
        let matrix = vec![vec![1.0, 0.0]];
        let content = vec!["alpha".to_string(), "beta".to_string()];

        let err = rank_texts(&[1.0, 0.0], &matrix, &content, &SearchConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::CountMismatch {
                chunks: 2,
                vectors: 1
            }
        ));
    }

    #[test]
    fn test_search_config_validation() {
        assert!(SearchConfig::new(0).is_err());
        assert_eq!(SearchConfig::new(1).unwrap().top_k, 1);

        let config = SearchConfig {
            similarity_threshold: 1.5,
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());

        let defaults = SearchConfig::default();
        assert_eq!(defaults.top_k, 3);
        assert_eq!(defaults.similarity_threshold, 0.5);
        assert!(!defaults.enforce_threshold);
    }
}
