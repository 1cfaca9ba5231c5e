//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the DocumentStore
//! trait. Each store owns one connection behind a mutex; several stores (or
//! processes) may share the same database file, with SQLite's locking
//! serializing their write transactions.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, StorageError, StorageResult};
use crate::storage::{
    CanonicalDocument, CollectionInfo, IndexedDocument, RawSnapshot, SearchHit, UpsertOutcome,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite document store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the store at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database or apply the schema
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // WAL lets readers proceed while a worker holds the write lock
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.execute_batch(
            "
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory store
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

/// Creates `name` if missing, returning true when it was created
fn create_collection(conn: &Connection, name: &str) -> StorageResult<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
        params![name, Utc::now().to_rfc3339()],
    )?;
    Ok(inserted > 0)
}

fn collection_exists(conn: &Connection, name: &str) -> StorageResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM collections WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn read_body(conn: &Connection, collection: &str, id: &str) -> StorageResult<Option<String>> {
    let body = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(body)
}

fn write_body(conn: &Connection, collection: &str, id: &str, body: &str) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO documents (collection, id, body, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        params![collection, id, body, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

impl DocumentStore for SqliteStore {
    // ===== Collections =====

    fn ensure_index(&self, name: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        create_collection(&conn, name)
    }

    fn index_exists(&self, name: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        collection_exists(&conn, name)
    }

    fn list_collections(&self) -> StorageResult<Vec<CollectionInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT c.name, c.created_at, COUNT(d.id)
             FROM collections c LEFT JOIN documents d ON d.collection = c.name
             GROUP BY c.name, c.created_at
             ORDER BY c.name",
        )?;

        let collections = stmt
            .query_map([], |row| {
                Ok(CollectionInfo {
                    name: row.get(0)?,
                    created_at: row.get(1)?,
                    documents: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(collections)
    }

    // ===== Writes =====

    fn write_raw(&self, collection: &str, doc: &IndexedDocument) -> StorageResult<()> {
        let body = serde_json::to_string(&doc.to_raw())?;
        let conn = self.lock()?;
        create_collection(&conn, collection)?;
        write_body(&conn, collection, &doc.url, &body)
    }

    fn upsert_canonical(
        &self,
        collection: &str,
        doc: &IndexedDocument,
    ) -> StorageResult<UpsertOutcome> {
        let mut conn = self.lock()?;

        // IMMEDIATE takes the write lock before the read, so a concurrent
        // writer cannot slip in between reading and writing the history
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        create_collection(&tx, collection)?;

        let (canonical, outcome) = match read_body(&tx, collection, &doc.url)? {
            Some(body) => {
                let mut existing: CanonicalDocument = serde_json::from_str(&body)?;
                let outcome = existing.apply(doc);
                (existing, outcome)
            }
            None => (CanonicalDocument::seed(doc), UpsertOutcome::Created),
        };

        let body = serde_json::to_string(&canonical)?;
        write_body(&tx, collection, &doc.url, &body)?;
        tx.commit()?;

        Ok(outcome)
    }

    // ===== Aliases =====

    fn move_alias(&self, alias: &str, to_index: &str) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !collection_exists(&tx, to_index)? {
            return Err(StorageError::CollectionNotFound(to_index.to_string()));
        }

        tx.execute("DELETE FROM aliases WHERE alias = ?1", params![alias])?;
        tx.execute(
            "INSERT INTO aliases (alias, collection) VALUES (?1, ?2)",
            params![alias, to_index],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn alias_targets(&self, alias: &str) -> StorageResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT collection FROM aliases WHERE alias = ?1 ORDER BY collection")?;

        let targets = stmt
            .query_map(params![alias], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(targets)
    }

    // ===== Reads =====

    fn get_raw(&self, collection: &str, id: &str) -> StorageResult<Option<RawSnapshot>> {
        let conn = self.lock()?;
        match read_body(&conn, collection, id)? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    fn get_canonical(
        &self,
        collection: &str,
        id: &str,
    ) -> StorageResult<Option<CanonicalDocument>> {
        let conn = self.lock()?;
        match read_body(&conn, collection, id)? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    fn count_documents(&self, collection: &str) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_history_entries(&self, collection: &str) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COALESCE(SUM(json_array_length(body, '$.version_history')), 0)
             FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn search(&self, target: &str, term: &str, limit: usize) -> StorageResult<Vec<SearchHit>> {
        let conn = self.lock()?;

        let is_alias: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM aliases WHERE alias = ?1 LIMIT 1",
                params![target],
                |row| row.get(0),
            )
            .optional()?;
        if is_alias.is_none() && !collection_exists(&conn, target)? {
            return Err(StorageError::CollectionNotFound(target.to_string()));
        }

        // Raw snapshots keep title/text at the top level, canonical documents
        // under `current`
        let mut stmt = conn.prepare(
            "SELECT id,
                    COALESCE(json_extract(body, '$.titulo'), json_extract(body, '$.current.titulo'), ''),
                    COALESCE(json_extract(body, '$.texto'), json_extract(body, '$.current.texto'), '')
             FROM documents
             WHERE collection = ?1
                OR collection IN (SELECT collection FROM aliases WHERE alias = ?1)
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![target], |row| {
                Ok(SearchHit {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    text: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // SQLite's lower() only folds ASCII, so accented text is matched here
        let needle = term.to_lowercase();
        let (mut hits, in_text): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .filter(|hit| {
                hit.title.to_lowercase().contains(&needle)
                    || hit.text.to_lowercase().contains(&needle)
            })
            .partition(|hit| hit.title.to_lowercase().contains(&needle));
        hits.extend(in_text);
        hits.truncate(limit);

        Ok(hits)
    }
}
