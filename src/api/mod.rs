//! API layer for lexrag-rs
//!
//! This module provides the engine handle and the query-side building
//! blocks: retrieval, context assembly, and generation.

pub mod assembler;
pub mod chat;
pub mod engine;
pub mod retriever;

// Re-export main API types
pub use assembler::{assemble, AssembledContext, SourceRef};
pub use chat::{context_only_response, GenerationClient};
pub use engine::{Answer, CrawlStarted, LexragEngine, ServiceStatus, SAMPLE_QUESTIONS};
pub use retriever::Retriever;
