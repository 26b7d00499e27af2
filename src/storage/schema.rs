//! Database schema definitions

/// Database schema version
pub const SCHEMA_VERSION: u32 = 1;

/// SQL for creating the chunks table.
///
/// `UNIQUE(url, position)` gives re-crawls upsert semantics: replacing a
/// stale passage keeps its rowid, so insertion order (the similarity
/// tie-break) survives re-indexing.
pub const CREATE_CHUNKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    url TEXT NOT NULL,
    position INTEGER NOT NULL,
    site TEXT NOT NULL,
    title TEXT NOT NULL,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    UNIQUE(url, position)
);
"#;

/// SQL for creating the metadata table
pub const CREATE_METADATA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// SQL for creating indexes used by site-filtered retrieval
pub const CREATE_CHUNKS_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_chunks_site ON chunks(site);
CREATE INDEX IF NOT EXISTS idx_chunks_url ON chunks(url);
"#;
