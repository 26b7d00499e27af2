//! SQLite-backed vector store
//!
//! Embedding records are keyed by `(url, position)` so that re-crawling a
//! page replaces its stale passages instead of accumulating duplicates.
//! Embeddings are stored as little-endian f32 blobs.

use crate::error::{LexragError, Result};
use crate::ml::Embedding;
use crate::storage::schema::*;
use crate::text::{Chunk, ChunkSource};
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

/// A record read back from the store, in insertion (rowid) order
#[derive(Debug, Clone)]
pub struct StoredChunk {
    /// Passage text
    pub text: String,

    /// Source page metadata
    pub source: ChunkSource,

    /// Stored embedding vector
    pub embedding: Embedding,
}

/// Vector store connection and operations
pub struct VectorStore {
    conn: Connection,
}

impl VectorStore {
    /// Open (or create) the vector store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| LexragError::Storage(format!("Failed to open vector store: {}", e)))?;

        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Open an existing store read-only, for the query side.
    ///
    /// Runs no schema setup, so opening never takes the write lock; WAL
    /// readers then proceed even while the crawl's writer is mid-upsert.
    /// The busy timeout covers the brief lock window around checkpoints.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            LexragError::Storage(format!("Failed to open vector store read-only: {}", e))
        })?;

        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| LexragError::Storage(format!("Failed to set busy timeout: {}", e)))?;

        Ok(Self { conn })
    }

    /// Create an in-memory store (for testing)
    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            LexragError::Storage(format!("Failed to create in-memory store: {}", e))
        })?;

        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Initialize schema and journaling mode
    fn initialize(&self) -> Result<()> {
        // WAL mode lets query connections read while the crawl writes.
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| LexragError::Storage(format!("Failed to enable WAL mode: {}", e)))?;

        self.conn
            .execute(CREATE_CHUNKS_TABLE, [])
            .map_err(|e| LexragError::Storage(format!("Failed to create chunks table: {}", e)))?;

        self.conn
            .execute(CREATE_METADATA_TABLE, [])
            .map_err(|e| LexragError::Storage(format!("Failed to create metadata table: {}", e)))?;

        self.conn
            .execute_batch(CREATE_CHUNKS_INDEXES)
            .map_err(|e| LexragError::Storage(format!("Failed to create indexes: {}", e)))?;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)",
                params![SCHEMA_VERSION.to_string()],
            )
            .map_err(|e| LexragError::Storage(format!("Failed to set schema version: {}", e)))?;

        log::debug!("Vector store initialized with schema version {}", SCHEMA_VERSION);
        Ok(())
    }

    /// Insert or replace the record for a chunk, keyed by (url, position)
    pub fn upsert_chunk(&self, chunk: &Chunk, embedding: &[f32]) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO chunks (url, position, site, title, text, embedding)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(url, position) DO UPDATE SET
                    site = excluded.site,
                    title = excluded.title,
                    text = excluded.text,
                    embedding = excluded.embedding
                "#,
                params![
                    chunk.source.url,
                    chunk.position as i64,
                    chunk.source.site,
                    chunk.source.title,
                    chunk.text,
                    embedding_to_blob(embedding),
                ],
            )
            .map_err(|e| {
                LexragError::Storage(format!(
                    "Failed to upsert chunk {} of {}: {}",
                    chunk.position, chunk.source.url, e
                ))
            })?;

        Ok(())
    }

    /// Read records in insertion order, optionally restricted to one site
    pub fn records(&self, site_filter: Option<&str>) -> Result<Vec<StoredChunk>> {
        let sql_all =
            "SELECT url, site, title, text, embedding FROM chunks ORDER BY rowid";
        let sql_site =
            "SELECT url, site, title, text, embedding FROM chunks WHERE site = ? ORDER BY rowid";

        let mut stmt = self
            .conn
            .prepare(if site_filter.is_some() { sql_site } else { sql_all })
            .map_err(|e| LexragError::Storage(format!("Failed to prepare query: {}", e)))?;

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<StoredChunk> {
            let url: String = row.get(0)?;
            let site: String = row.get(1)?;
            let title: String = row.get(2)?;
            let text: String = row.get(3)?;
            let blob: Vec<u8> = row.get(4)?;
            Ok(StoredChunk {
                text,
                source: ChunkSource::new(url, title, site),
                embedding: blob_to_embedding(&blob),
            })
        };

        let rows = match site_filter {
            Some(site) => stmt.query_map(params![site], map_row),
            None => stmt.query_map([], map_row),
        }
        .map_err(|e| LexragError::Storage(format!("Failed to query records: {}", e)))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(
                row.map_err(|e| LexragError::Storage(format!("Failed to read record: {}", e)))?,
            );
        }
        Ok(records)
    }

    /// Total number of records in the store
    pub fn record_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| LexragError::Storage(format!("Failed to count records: {}", e)))?;
        Ok(count as usize)
    }
}

/// Encode an embedding as a little-endian f32 blob
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        bytes.extend_from_slice(&val.to_le_bytes());
    }
    bytes
}

/// Decode a little-endian f32 blob back into an embedding
fn blob_to_embedding(blob: &[u8]) -> Embedding {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_chunk(url: &str, position: usize, site: &str, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source: ChunkSource::new(url, "Some Title", site),
            position,
        }
    }

    #[test]
    fn test_embedding_blob_roundtrip() {
        let embedding = vec![0.25f32, -1.5, 3.75, 0.0];
        let blob = embedding_to_blob(&embedding);
        assert_eq!(blob.len(), 16);
        assert_eq!(blob_to_embedding(&blob), embedding);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = VectorStore::memory().unwrap();
        let chunk = make_chunk("https://kenyalaw.org/a", 0, "kenyalaw.org", "first text");

        store.upsert_chunk(&chunk, &[1.0, 0.0]).unwrap();
        store.upsert_chunk(&chunk, &[1.0, 0.0]).unwrap();
        assert_eq!(store.record_count().unwrap(), 1);

        // Re-crawled content replaces the record rather than duplicating it.
        let updated = make_chunk("https://kenyalaw.org/a", 0, "kenyalaw.org", "revised text");
        store.upsert_chunk(&updated, &[0.0, 1.0]).unwrap();
        assert_eq!(store.record_count().unwrap(), 1);

        let records = store.records(None).unwrap();
        assert_eq!(records[0].text, "revised text");
        assert_eq!(records[0].embedding, vec![0.0, 1.0]);
    }

    #[test]
    fn test_reindex_bounded_by_positions() {
        let store = VectorStore::memory().unwrap();
        // Two indexing passes over the same three positions.
        for _ in 0..2 {
            for position in 0..3 {
                let chunk = make_chunk(
                    "https://kenyalaw.org/act",
                    position,
                    "kenyalaw.org",
                    "passage",
                );
                store.upsert_chunk(&chunk, &[0.5, 0.5]).unwrap();
            }
        }
        assert_eq!(store.record_count().unwrap(), 3);
    }

    #[test]
    fn test_site_filter() {
        let store = VectorStore::memory().unwrap();
        store
            .upsert_chunk(
                &make_chunk("https://kenyalaw.org/a", 0, "kenyalaw.org", "old site"),
                &[1.0],
            )
            .unwrap();
        store
            .upsert_chunk(
                &make_chunk("https://new.kenyalaw.org/b", 0, "new.kenyalaw.org", "new site"),
                &[1.0],
            )
            .unwrap();

        let filtered = store.records(Some("kenyalaw.org")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].source.site, "kenyalaw.org");

        let all = store.records(None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_records_in_insertion_order() {
        let store = VectorStore::memory().unwrap();
        for position in 0..4 {
            store
                .upsert_chunk(
                    &make_chunk("https://kenyalaw.org/a", position, "kenyalaw.org", "p"),
                    &[position as f32],
                )
                .unwrap();
        }
        let records = store.records(None).unwrap();
        let order: Vec<f32> = records.iter().map(|r| r.embedding[0]).collect();
        assert_eq!(order, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");

        {
            let store = VectorStore::open(&path).unwrap();
            store
                .upsert_chunk(
                    &make_chunk("https://kenyalaw.org/a", 0, "kenyalaw.org", "persisted"),
                    &[0.1, 0.2],
                )
                .unwrap();
        }

        let reopened = VectorStore::open(&path).unwrap();
        assert_eq!(reopened.record_count().unwrap(), 1);
        assert_eq!(reopened.records(None).unwrap()[0].text, "persisted");
    }
}
