//! Error types for lexrag-rs
//!
//! This module provides comprehensive error handling for all engine operations,
//! including crawling, text processing, embedding, storage, and generation.

use thiserror::Error;

/// Main error type for lexrag operations
#[derive(Error, Debug)]
pub enum LexragError {
    /// Fetch failures (connection, timeout, non-2xx, non-HTML content).
    /// Non-fatal during a crawl: the URL is skipped.
    #[error("Network error: {0}")]
    Network(String),

    /// Text processing errors
    #[error("Text processing error: {0}")]
    TextProcessing(String),

    /// Embedding computation errors. Non-fatal during indexing: the chunk
    /// is skipped.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector search errors
    #[error("Search error: {0}")]
    Search(String),

    /// Database/storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The generation backend is unreachable or returned an error. Always
    /// surfaced to the caller; never substituted with a fabricated answer.
    #[error("Generation backend unavailable: {0}")]
    GenerationUnavailable(String),

    /// A query arrived before the engine finished initializing
    #[error("Service not yet initialized")]
    ServiceNotInitialized,

    /// A crawl start was rejected because one is already running
    #[error("A crawl is already in progress")]
    AlreadyRunning,

    /// Crawl state errors (corrupt checkpoint, bad seed URL)
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for lexrag operations
pub type Result<T> = std::result::Result<T, LexragError>;

// Implement From traits for external error types
impl From<reqwest::Error> for LexragError {
    fn from(err: reqwest::Error) -> Self {
        LexragError::Network(err.to_string())
    }
}

impl From<url::ParseError> for LexragError {
    fn from(err: url::ParseError) -> Self {
        LexragError::Crawl(format!("invalid URL: {}", err))
    }
}
