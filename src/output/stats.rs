//! Statistics over the document store
//!
//! This module provides functionality for extracting and displaying
//! index statistics from the storage layer.

use crate::storage::{CollectionInfo, DocumentStore, IndexNames, StorageError};
use crate::CrawlError;

/// Index statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStatistics {
    /// Every collection with its document count
    pub collections: Vec<CollectionInfo>,

    /// Name of the alias these statistics were taken for
    pub alias: String,

    /// Collection the alias points at, if it has been published
    pub alias_target: Option<String>,

    /// Number of canonical documents
    pub canonical_documents: u64,

    /// Total version history entries across canonical documents
    pub history_entries: u64,
}

impl IndexStatistics {
    /// Average number of recorded versions per canonical document
    pub fn versions_per_document(&self) -> f64 {
        if self.canonical_documents == 0 {
            0.0
        } else {
            self.history_entries as f64 / self.canonical_documents as f64
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The store to query
/// * `names` - Collection and alias names of the configured base
///
/// # Returns
///
/// * `Ok(IndexStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - Failed to query statistics
pub fn load_statistics(
    store: &dyn DocumentStore,
    names: &IndexNames,
) -> Result<IndexStatistics, CrawlError> {
    let collections = store.list_collections()?;

    let alias_target = match store.resolve_alias(&names.alias) {
        Ok(target) => Some(target),
        Err(StorageError::AliasNotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(IndexStatistics {
        collections,
        alias: names.alias.clone(),
        alias_target,
        canonical_documents: store.count_documents(&names.canonical)?,
        history_entries: store.count_history_entries(&names.canonical)?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &IndexStatistics) {
    println!("=== Index Statistics ===\n");

    println!("Collections ({}):", stats.collections.len());
    for collection in &stats.collections {
        let marker = if stats.alias_target.as_deref() == Some(collection.name.as_str()) {
            " <- current"
        } else {
            ""
        };
        println!(
            "  {}: {} documents (created {}){}",
            collection.name, collection.documents, collection.created_at, marker
        );
    }
    println!();

    match &stats.alias_target {
        Some(target) => println!("Alias {} -> {}", stats.alias, target),
        None => println!("Alias {} is not published", stats.alias),
    }
    println!();

    println!("Canonical view:");
    println!("  Documents: {}", stats.canonical_documents);
    println!("  Version history entries: {}", stats.history_entries);
    println!(
        "  Versions per document: {:.2}",
        stats.versions_per_document()
    );
}
