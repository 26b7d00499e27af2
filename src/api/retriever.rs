//! Query-side retrieval
//!
//! Embeds the query and ranks stored passages by cosine similarity. Each
//! search opens its own read connection to the vector store, so queries run
//! concurrently with an in-progress crawl (the store is in WAL mode) and
//! never block on the writer.

use crate::error::Result;
use crate::ml::{cosine_similarity, ScoredChunk, TextEmbedder};
use crate::storage::VectorStore;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Similarity search over the persisted vector store
#[derive(Clone)]
pub struct Retriever {
    store_path: PathBuf,
    embedder: TextEmbedder,
}

impl Retriever {
    /// Create a retriever for the store at the given path
    pub fn new<P: AsRef<Path>>(store_path: P, embedder: TextEmbedder) -> Self {
        Self {
            store_path: store_path.as_ref().to_path_buf(),
            embedder,
        }
    }

    /// Return up to `top_k` passages most similar to the query, optionally
    /// restricted to one site.
    ///
    /// Results are ordered by non-increasing similarity; equal scores keep
    /// their insertion order (the sort is stable over rowid order). An
    /// empty index yields an empty result set, not an error.
    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        site_filter: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed(query)?;

        // No store file yet means nothing has been indexed.
        if !self.store_path.exists() {
            return Ok(Vec::new());
        }

        let store = VectorStore::open_read_only(&self.store_path)?;
        let records = store.records(site_filter)?;

        let mut results: Vec<ScoredChunk> = records
            .into_iter()
            .map(|record| {
                let score = cosine_similarity(&query_embedding, &record.embedding);
                ScoredChunk {
                    text: record.text,
                    source: record.source,
                    score,
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(top_k);

        log::debug!(
            "Retrieved {} passages for query '{}' (site filter: {:?})",
            results.len(),
            query,
            site_filter
        );
        Ok(results)
    }
}
