//! # lexrag-rs
//!
//! A retrieval-augmented question answering engine for Kenyan legal
//! publications: a resumable, polite web crawler feeds a chunking and
//! embedding pipeline backed by SQLite, and queries are answered by an
//! OpenAI-compatible generation backend grounded in the retrieved passages.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lexrag_rs::{Config, LexragEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = LexragEngine::new(Config::default());
//!     engine.initialize().await?;
//!
//!     // Index the configured legal publication sites
//!     engine.start_crawl(100, 3, true)?;
//!     engine.wait_for_crawl().await?;
//!
//!     // Ask a grounded question
//!     let answer = engine
//!         .ask("How is the judiciary structured in Kenya?", None, None)
//!         .await?;
//!     println!("{}", answer.response);
//!     for source in &answer.sources {
//!         println!("  - {} ({})", source.title, source.url);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod config;
pub mod crawl;
pub mod error;
pub mod ml;
pub mod storage;
pub mod text;

// Re-export main API types
pub use api::{
    assemble, context_only_response, Answer, AssembledContext, CrawlStarted, GenerationClient,
    LexragEngine, Retriever, ServiceStatus, SourceRef, SAMPLE_QUESTIONS,
};
pub use config::Config;
pub use error::{LexragError, Result};

// Re-export commonly used types
pub use crawl::CrawlStats;
pub use ml::ScoredChunk;
pub use text::{Chunk, ChunkSource, Document};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_imports() {
        // Ensure all major types can be imported
        let _config = Config::default();
    }
}
