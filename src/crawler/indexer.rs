//! Writes crawled documents into the versioned store
//!
//! A document goes to two places: its raw snapshot in the run's dated
//! collection, and (pages only) the canonical collection. The two writes are
//! independent; one failing never stops or undoes the other, and each outcome
//! is logged separately.

use crate::crawler::events;
use crate::storage::{DocumentStore, IndexNames, IndexedDocument, StorageError};
use crate::url::{extract_domain, UrlKind};
use crate::CrawlError;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Shared by all workers of a run
pub struct Indexer {
    store: Arc<dyn DocumentStore>,
    names: IndexNames,
    snapshot_dir: Option<PathBuf>,
}

impl Indexer {
    pub fn new(store: Arc<dyn DocumentStore>, names: IndexNames) -> Self {
        Self {
            store,
            names,
            snapshot_dir: None,
        }
    }

    /// Enables HTML snapshots under `dir`
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    pub fn names(&self) -> &IndexNames {
        &self.names
    }

    /// Writes the raw snapshot and, for pages, upserts the canonical document
    ///
    /// Assets only get a raw snapshot. Returns [`CrawlError::Index`] carrying
    /// whichever of the two writes failed.
    pub fn index(&self, doc: &IndexedDocument) -> Result<(), CrawlError> {
        let raw = match self.store.write_raw(&self.names.raw, doc) {
            Ok(()) => {
                tracing::info!(
                    event = events::INDEX_RAW_OK,
                    index = %self.names.raw,
                    url = %doc.url,
                    "raw snapshot written"
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    event = events::INDEX_RAW_ERROR,
                    index = %self.names.raw,
                    url = %doc.url,
                    error = %e,
                    "raw snapshot write failed"
                );
                Some(e)
            }
        };

        let canonical = match doc.kind {
            UrlKind::Asset => None,
            UrlKind::Page => self.upsert_canonical(doc).err(),
        };

        if raw.is_none() && canonical.is_none() {
            return Ok(());
        }

        Err(CrawlError::Index {
            url: doc.url.clone(),
            raw,
            canonical,
        })
    }

    fn upsert_canonical(&self, doc: &IndexedDocument) -> Result<(), StorageError> {
        match self.store.upsert_canonical(&self.names.canonical, doc) {
            Ok(outcome) => {
                tracing::info!(
                    event = events::INDEX_CANON_OK,
                    index = %self.names.canonical,
                    url = %doc.url,
                    outcome = ?outcome,
                    "canonical document upserted"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    event = events::INDEX_CANON_ERROR,
                    index = %self.names.canonical,
                    url = %doc.url,
                    error = %e,
                    "canonical upsert failed"
                );
                Err(e)
            }
        }
    }

    /// Saves the page's HTML when snapshots are enabled
    ///
    /// Failures are logged as `save_html_error` and otherwise ignored.
    pub async fn save_snapshot(&self, url: &Url, html: &str) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };

        let path = dir.join(snapshot_file_name(url));
        if let Err(e) = tokio::fs::write(&path, html).await {
            tracing::warn!(
                event = events::SAVE_HTML_ERROR,
                url = %url,
                path = %path.display(),
                error = %e,
                "failed to save HTML snapshot"
            );
        }
    }
}

/// Returns the snapshot file name for a url: `{domain}__{path}.html`
///
/// The domain keeps its explicit port with `:` replaced by `_`; `/` in the path
/// becomes `_`, leading and trailing `_` are trimmed, and an empty path is
/// written as `index`.
pub fn snapshot_file_name(url: &Url) -> String {
    let domain = extract_domain(url).unwrap_or_default().replace(':', "_");

    let path = url.path().replace('/', "_");
    let path = path.trim_matches('_');
    let path = if path.is_empty() { "index" } else { path };

    format!("{}__{}.html", domain, path)
}
