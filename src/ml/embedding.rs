//! Deterministic feature-hashed text embeddings
//!
//! Passages are embedded by distributing hashed token information across a
//! fixed number of dimensions, followed by sequence-length normalization and
//! an optional final L2 normalization. The embedding is fully deterministic,
//! requires no model download, and is stable across process restarts, which
//! is what the persisted vector store relies on.

use crate::config::EmbeddingConfig;
use crate::error::{LexragError, Result};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Deterministic text embedder
#[derive(Debug, Clone)]
pub struct TextEmbedder {
    config: EmbeddingConfig,
}

impl TextEmbedder {
    /// Create a new embedder with the given configuration
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    /// Embedding dimension produced by this embedder
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Generate the embedding for a single text.
    ///
    /// Empty or whitespace-only text cannot be embedded and is reported as
    /// an [`LexragError::Embedding`]; during indexing the caller logs the
    /// failure and skips the chunk.
    pub fn embed(&self, text: &str) -> Result<Embedding> {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|word| word.to_lowercase())
            .collect();

        if tokens.is_empty() {
            return Err(LexragError::Embedding(
                "cannot embed empty text".to_string(),
            ));
        }

        let dim = self.config.dimension;
        let mut embedding = vec![0.0f32; dim];

        for (i, token) in tokens.iter().enumerate() {
            // Multiple hash functions per token for better distribution
            // across dimensions.
            for hash_func in 0u64..5 {
                let mut hasher = DefaultHasher::new();
                token.hash(&mut hasher);
                hash_func.wrapping_mul(1000).hash(&mut hasher);
                let hash = hasher.finish();

                for j in 0..20 {
                    let dim_idx = ((hash as usize)
                        .wrapping_add(j * 19)
                        .wrapping_add(i * 17))
                        % dim;
                    let value = ((hash >> (j * 3)) & 0x7) as f32 / 8.0 - 0.5;
                    embedding[dim_idx] += value * (1.0 / (i as f32 + 1.0).sqrt());
                }
            }

            // Positional weighting: earlier tokens contribute slightly more.
            let pos_weight = 1.0 - (i as f32 / tokens.len() as f32) * 0.1;
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let token_hash = hasher.finish();
            for k in 0..10 {
                let dim_idx = ((token_hash as usize).wrapping_mul(7).wrapping_add(k * 13)) % dim;
                embedding[dim_idx] += ((token_hash % 30000) as f32 / 30000.0) * pos_weight;
            }
        }

        // Sequence-length normalization keeps long passages comparable with
        // short queries.
        let seq_norm = 1.0 / (tokens.len() as f32).sqrt();
        for val in &mut embedding {
            *val *= seq_norm;
        }

        if self.config.normalize {
            Ok(normalize_embedding(embedding))
        } else {
            Ok(embedding)
        }
    }

    /// Generate embeddings for multiple texts, collecting failures separately
    /// so a single bad passage never aborts an indexing run
    pub fn embed_batch(&self, texts: &[String]) -> (Vec<(usize, Embedding)>, Vec<usize>) {
        let mut embeddings = Vec::new();
        let mut failed = Vec::new();

        for (idx, text) in texts.iter().enumerate() {
            match self.embed(text) {
                Ok(embedding) => embeddings.push((idx, embedding)),
                Err(e) => {
                    log::warn!("Failed to embed text at index {}: {}", idx, e);
                    failed.push(idx);
                }
            }
        }

        (embeddings, failed)
    }
}

/// Normalize an embedding to unit length
fn normalize_embedding(mut embedding: Embedding) -> Embedding {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 {
        for val in &mut embedding {
            *val /= norm;
        }
    }
    embedding
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn embedder() -> TextEmbedder {
        TextEmbedder::new(EmbeddingConfig::default())
    }

    #[test]
    fn test_deterministic() {
        let e = embedder();
        let a = e.embed("land registration in kenya").unwrap();
        let b = e.embed("land registration in kenya").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dimension() {
        let e = embedder();
        let v = e.embed("the constitution of kenya").unwrap();
        assert_eq!(v.len(), 384);
    }

    #[test]
    fn test_unit_norm() {
        let e = embedder();
        let v = e.embed("environmental protection statutes").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_distinct_texts_differ() {
        let e = embedder();
        let a = e.embed("divorce proceedings").unwrap();
        let b = e.embed("intellectual property").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_case_insensitive() {
        let e = embedder();
        let a = e.embed("Land Registration Act").unwrap();
        let b = e.embed("land registration act").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_text_rejected() {
        let e = embedder();
        assert!(matches!(e.embed(""), Err(LexragError::Embedding(_))));
        assert!(matches!(e.embed("   \t\n"), Err(LexragError::Embedding(_))));
    }

    #[test]
    fn test_batch_skips_failures() {
        let e = embedder();
        let texts = vec![
            "first passage".to_string(),
            "   ".to_string(),
            "third passage".to_string(),
        ];
        let (ok, failed) = e.embed_batch(&texts);
        assert_eq!(ok.len(), 2);
        assert_eq!(failed, vec![1]);
        assert_eq!(ok[0].0, 0);
        assert_eq!(ok[1].0, 2);
    }
}
