//! Storage traits and error types
//!
//! This module defines the trait interface for document store backends and
//! associated error types.

use crate::storage::{
    CanonicalDocument, CollectionInfo, IndexedDocument, RawSnapshot, SearchHit, UpsertOutcome,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for document store backends
///
/// Implementations are shared by every worker of a run, so all methods take
/// `&self` and must be safe to call concurrently. `upsert_canonical` and
/// `move_alias` must each be atomic with respect to other writers, including
/// writers in other processes.
pub trait DocumentStore: Send + Sync {
    // ===== Collections =====

    /// Creates a collection if it does not exist yet
    ///
    /// Returns true if the collection was created by this call.
    fn ensure_index(&self, name: &str) -> StorageResult<bool>;

    /// Checks whether a collection exists
    fn index_exists(&self, name: &str) -> StorageResult<bool>;

    /// Lists all collections with their document counts
    fn list_collections(&self) -> StorageResult<Vec<CollectionInfo>>;

    // ===== Writes =====

    /// Inserts or overwrites the raw snapshot of a url in a dated collection
    ///
    /// Never touches the canonical collection or any history.
    fn write_raw(&self, collection: &str, doc: &IndexedDocument) -> StorageResult<()>;

    /// Creates or updates the canonical document of a url
    ///
    /// Runs as a single atomic read-modify-write: a missing record is seeded
    /// with one history entry; otherwise a history entry is appended when the
    /// content hash changed, and `current`/`_meta` are overwritten either way.
    fn upsert_canonical(
        &self,
        collection: &str,
        doc: &IndexedDocument,
    ) -> StorageResult<UpsertOutcome>;

    // ===== Aliases =====

    /// Atomically points `alias` at `to_index`, dropping every other binding
    fn move_alias(&self, alias: &str, to_index: &str) -> StorageResult<()>;

    /// Returns every collection currently bound to `alias`
    fn alias_targets(&self, alias: &str) -> StorageResult<Vec<String>>;

    // ===== Reads =====

    /// Gets a raw snapshot by url
    fn get_raw(&self, collection: &str, id: &str) -> StorageResult<Option<RawSnapshot>>;

    /// Gets a canonical document by url
    fn get_canonical(&self, collection: &str, id: &str)
        -> StorageResult<Option<CanonicalDocument>>;

    /// Counts documents in a collection
    fn count_documents(&self, collection: &str) -> StorageResult<u64>;

    /// Sums the version history lengths of every document in a collection
    fn count_history_entries(&self, collection: &str) -> StorageResult<u64>;

    /// Finds documents whose title or text contains `term`
    ///
    /// `target` may be an alias or a collection name. Title matches come
    /// first; there is no relevance scoring beyond that.
    fn search(&self, target: &str, term: &str, limit: usize) -> StorageResult<Vec<SearchHit>>;

    /// Resolves an alias to its single target collection
    fn resolve_alias(&self, alias: &str) -> StorageResult<String> {
        self.alias_targets(alias)?
            .pop()
            .ok_or_else(|| StorageError::AliasNotFound(alias.to_string()))
    }
}
