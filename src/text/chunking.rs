//! Overlapping character-window chunking
//!
//! Documents are split into fixed-size passages that overlap by a configured
//! amount, so that statements falling on a window boundary still appear whole
//! in at least one passage. Chunks are the unit of embedding and retrieval.

use crate::config::ChunkingConfig;
use crate::error::{LexragError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sentinel used when a page has no usable URL or site
pub const UNKNOWN: &str = "Unknown";

/// Sentinel used when a page carries no title
pub const UNTITLED: &str = "Untitled";

/// A raw page emitted by the crawler. Consumed once by the chunker and then
/// discarded; only its chunks are retained.
#[derive(Debug, Clone)]
pub struct Document {
    /// Canonical page URL
    pub url: String,

    /// Page title, or [`UNTITLED`]
    pub title: String,

    /// Site the page belongs to
    pub site: String,

    /// Extracted visible text
    pub text: String,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Fixed source metadata carried by every chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Source page URL
    pub url: String,

    /// Source page title
    pub title: String,

    /// Site the page belongs to
    pub site: String,
}

impl ChunkSource {
    /// Create source metadata, substituting sentinels for empty fields
    pub fn new<U: Into<String>, T: Into<String>, S: Into<String>>(
        url: U,
        title: T,
        site: S,
    ) -> Self {
        let url = url.into();
        let title = title.into();
        let site = site.into();
        Self {
            url: if url.is_empty() { UNKNOWN.to_string() } else { url },
            title: if title.is_empty() { UNTITLED.to_string() } else { title },
            site: if site.is_empty() { UNKNOWN.to_string() } else { site },
        }
    }
}

/// A single overlapping passage of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Passage text
    pub text: String,

    /// Source page metadata
    pub source: ChunkSource,

    /// Zero-based position of this passage within its document
    pub position: usize,
}

/// Character-window chunker with overlap
pub struct Chunker {
    config: ChunkingConfig,
    whitespace_regex: Regex,
}

impl Chunker {
    /// Create a new chunker, validating the window/overlap configuration
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(LexragError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if config.overlap >= config.chunk_size {
            return Err(LexragError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                config.overlap, config.chunk_size
            )));
        }

        let whitespace_regex = Regex::new(r"\s+").map_err(|e| {
            LexragError::TextProcessing(format!("Failed to compile whitespace regex: {}", e))
        })?;

        Ok(Self {
            config,
            whitespace_regex,
        })
    }

    /// Split a document into overlapping chunks.
    ///
    /// Deterministic for a given configuration: the window slides forward by
    /// `chunk_size - overlap` characters per step and the final chunk may be
    /// shorter than the window. Windows are counted in characters, not bytes,
    /// so multi-byte text never splits inside a code point.
    pub fn chunk_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        let text = self.preprocess_text(&document.text);
        let source = ChunkSource::new(
            document.url.clone(),
            document.title.clone(),
            document.site.clone(),
        );

        let mut chunks = Vec::new();
        if text.is_empty() {
            return Ok(chunks);
        }

        // Byte offset of every character plus the end-of-string offset, so
        // character windows map to valid byte slices.
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        let total_chars = offsets.len() - 1;

        let step = self.config.chunk_size - self.config.overlap;
        let mut start = 0usize;
        let mut position = 0usize;

        while start < total_chars {
            let end = std::cmp::min(start + self.config.chunk_size, total_chars);
            let chunk_text = text[offsets[start]..offsets[end]].to_string();

            chunks.push(Chunk {
                text: chunk_text,
                source: source.clone(),
                position,
            });
            position += 1;

            if end == total_chars {
                break;
            }
            start += step;
        }

        Ok(chunks)
    }

    /// Normalize whitespace: trim lines, drop blank ones, squeeze runs of
    /// whitespace to single spaces
    fn preprocess_text(&self, text: &str) -> String {
        let normalized = text
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        self.whitespace_regex
            .replace_all(&normalized, " ")
            .to_string()
    }
}
