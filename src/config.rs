//! Configuration for the lexrag engine
//!
//! All tunables live here as nested, serde-friendly structs so an embedding
//! application can load them from a file or environment and hand a single
//! `Config` to the engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A crawl target: one legal-publication site with its seed URL.
///
/// The `site` string doubles as the allow-list scope: discovered links are
/// kept only when their host matches a configured site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlTarget {
    /// Site identifier, e.g. "kenyalaw.org"
    pub site: String,

    /// URL the crawl starts from when not resuming
    pub seed_url: String,
}

impl CrawlTarget {
    /// Create a new crawl target
    pub fn new<S: Into<String>, U: Into<String>>(site: S, seed_url: U) -> Self {
        Self {
            site: site.into(),
            seed_url: seed_url.into(),
        }
    }
}

/// Crawler and fetcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Sites the crawler is allowed to visit
    pub targets: Vec<CrawlTarget>,

    /// Global ceiling on in-flight HTTP requests across the whole crawl
    pub concurrent_requests: usize,

    /// Politeness delay applied per worker before each request, in milliseconds
    pub request_delay_ms: u64,

    /// Per-fetch timeout in seconds
    pub fetch_timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                CrawlTarget::new("kenyalaw.org", "https://kenyalaw.org/"),
                CrawlTarget::new("new.kenyalaw.org", "https://new.kenyalaw.org/"),
            ],
            // Conservative defaults to avoid overwhelming the target servers
            concurrent_requests: 2,
            request_delay_ms: 500,
            fetch_timeout_secs: 30,
            user_agent: format!("lexrag-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Chunking settings for splitting documents into passages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Character window per chunk
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks. Must be smaller than
    /// `chunk_size` or chunking cannot make forward progress.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// Embedding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding vector dimension
    pub dimension: usize,

    /// Whether to L2-normalize embeddings
    pub normalize: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            normalize: true,
        }
    }
}

/// Retrieval and context assembly settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of passages retrieved per query
    pub top_k: usize,

    /// Total character budget for the assembled grounding context
    pub max_context_size: usize,

    /// Secondary cap on the number of passages included in the context
    pub max_context_chunks: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_context_size: 4000,
            max_context_chunks: 10,
        }
    }
}

/// Generation backend settings (any OpenAI-compatible endpoint; the default
/// points at a local Ollama server)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the OpenAI-compatible API
    pub api_base: String,

    /// API key; local backends such as Ollama accept any value
    pub api_key: String,

    /// Model used when the caller does not name one
    pub default_model: String,

    /// Per-generation-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434/v1".to_string(),
            api_key: "ollama".to_string(),
            default_model: "llama3".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the vector store database and crawl checkpoints
    pub store_dir: PathBuf,

    /// Crawler settings
    pub crawl: CrawlConfig,

    /// Chunking settings
    pub chunking: ChunkingConfig,

    /// Embedding settings
    pub embedding: EmbeddingConfig,

    /// Retrieval settings
    pub search: SearchConfig,

    /// Generation backend settings
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("vector_db"),
            crawl: CrawlConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}
