//! Text processing and chunking functionality for lexrag-rs
//!
//! This module turns raw crawled documents into the overlapping passages
//! that get embedded and retrieved.

pub mod chunking;

// Re-export main types and functions
pub use chunking::{Chunk, ChunkSource, Chunker, Document, UNKNOWN, UNTITLED};
