//! Embedding and similarity search primitives for lexrag-rs
//!
//! This module provides deterministic passage embeddings and the cosine
//! similarity scoring used by the retriever.

pub mod embedding;
pub mod search;

// Re-export main types and functions
pub use embedding::{Embedding, TextEmbedder};
pub use search::{cosine_similarity, ScoredChunk};
