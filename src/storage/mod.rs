//! Persistent vector storage for lexrag-rs
//!
//! This module provides the embedded SQLite vector store that survives
//! process restarts. The crawl pipeline is the only writer; queries open
//! their own read connections, so WAL mode lets searches run concurrently
//! with an in-progress crawl.

pub mod database;
pub mod schema;

// Re-export main types
pub use database::{StoredChunk, VectorStore};
