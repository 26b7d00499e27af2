//! Crawling functionality for lexrag-rs
//!
//! This module drives the polite, resumable harvest of legal-publication
//! pages: a bounded-concurrency fetcher, a frontier with persisted crawl
//! state, and the crawl loop that feeds fetched pages into the chunking and
//! indexing pipeline.

pub mod crawler;
pub mod fetcher;
pub mod frontier;

// Re-export main types
pub use crawler::{CrawlStats, Crawler};
pub use fetcher::{FetchedPage, Fetcher};
pub use frontier::{Frontier, FrontierEntry};
