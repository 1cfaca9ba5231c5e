//! Database schema definitions
//!
//! Collections play the role of search indices: documents are keyed by
//! `(collection, id)` and hold their JSON body; aliases bind a name to one
//! or more collections.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Named document collections (raw dated snapshots and the canonical view)
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

-- Documents, keyed by url within a collection
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL REFERENCES collections(name),
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

-- Alias bindings; move_alias keeps exactly one row per alias
CREATE TABLE IF NOT EXISTS aliases (
    alias TEXT NOT NULL,
    collection TEXT NOT NULL REFERENCES collections(name),
    PRIMARY KEY (alias, collection)
);

CREATE INDEX IF NOT EXISTS idx_aliases_alias ON aliases(alias);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
