//! Similarity scoring for retrieval
//!
//! Retrieval works over the persisted vector store with exact brute-force
//! cosine scoring. Corpus sizes here (thousands of passages) make an
//! approximate index unnecessary, and exact scoring gives the stable,
//! reproducible orderings the retriever guarantees.

use crate::text::ChunkSource;
use serde::{Deserialize, Serialize};

/// A retrieved passage with its similarity score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Passage text
    pub text: String,

    /// Source page metadata
    pub source: ChunkSource,

    /// Cosine similarity to the query, in [-1, 1]
    pub score: f32,
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero vectors rather than treating
/// either as an error; such records simply rank last.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_vectors() {
        let v = vec![0.5, 0.5, 0.5];
        assert_relative_eq!(cosine_similarity(&v, &v), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_relative_eq!(cosine_similarity(&a, &b), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_opposite_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert_relative_eq!(cosine_similarity(&a, &b), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_length_mismatch_scores_zero() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
