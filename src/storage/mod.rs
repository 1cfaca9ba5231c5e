//! Storage module for the versioned document index
//!
//! This module handles all persistence for the crawler, including:
//! - Dated raw snapshot collections, written once per url and crawl version
//! - The canonical collection, one document per url with an append-only
//!   version history
//! - The alias that points readers at the most recent raw collection
//!
//! Document bodies keep the field names downstream readers expect
//! (`titulo`, `texto`, `tipo`, `_meta`).

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{DocumentStore, StorageError, StorageResult};

use crate::hash::content_hash;
use crate::url::UrlKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Names of the collections and alias touched by one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNames {
    /// Dated raw collection, `{base}-{crawl_version}`
    pub raw: String,
    /// Canonical collection, `{base}_canon`
    pub canonical: String,
    /// Alias readers use for the latest raw collection, `{base}_current`
    pub alias: String,
    /// Crawl version label stamped on every document of the run
    pub crawl_version: String,
}

impl IndexNames {
    pub fn new(base: &str, crawl_version: &str) -> Self {
        Self {
            raw: format!("{}-{}", base, crawl_version),
            canonical: format!("{}_canon", base),
            alias: format!("{}_current", base),
            crawl_version: crawl_version.to_string(),
        }
    }
}

/// Crawl metadata stored under `_meta`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub last_crawled_at: DateTime<Utc>,
    pub crawl_version: String,
    pub content_hash: String,
}

/// One entry of a canonical document's change history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub crawled_at: DateTime<Utc>,
    pub crawl_version: String,
    pub content_hash: String,
}

/// Immutable per-run record of a url's fetched content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSnapshot {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "texto")]
    pub text: String,
    pub url: String,
    #[serde(rename = "tipo")]
    pub kind: UrlKind,
    #[serde(rename = "_meta")]
    pub meta: DocumentMeta,
}

/// Latest known content of a canonical document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalContent {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "texto")]
    pub text: String,
    pub url: String,
}

/// Deduplicated view of a url plus its append-only change history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    pub current: CanonicalContent,
    #[serde(rename = "_meta")]
    pub meta: DocumentMeta,
    #[serde(default)]
    pub version_history: Vec<VersionEntry>,
}

/// What an upsert did to the canonical document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No canonical document existed; one was created with a single history entry
    Created,
    /// The content hash changed; one history entry was appended
    Appended,
    /// The content hash matched; only `current` and `_meta` were rewritten
    Unchanged,
}

/// A crawled or imported document, ready to be written to both views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    pub url: String,
    pub title: String,
    pub text: String,
    pub kind: UrlKind,
    pub crawled_at: DateTime<Utc>,
    pub crawl_version: String,
    pub content_hash: String,
}

impl IndexedDocument {
    /// Builds a document, fingerprinting its text (or its url when text is empty)
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        kind: UrlKind,
        crawl_version: impl Into<String>,
        crawled_at: DateTime<Utc>,
    ) -> Self {
        let url = url.into();
        let text = text.into();
        let content_hash = content_hash(&url, &text);
        Self {
            url,
            title: title.into(),
            text,
            kind,
            crawled_at,
            crawl_version: crawl_version.into(),
            content_hash,
        }
    }

    /// Builds an asset document: identity only, empty title and text
    pub fn asset(
        url: impl Into<String>,
        crawl_version: impl Into<String>,
        crawled_at: DateTime<Utc>,
    ) -> Self {
        Self::new(url, "", "", UrlKind::Asset, crawl_version, crawled_at)
    }

    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            last_crawled_at: self.crawled_at,
            crawl_version: self.crawl_version.clone(),
            content_hash: self.content_hash.clone(),
        }
    }

    pub fn version_entry(&self) -> VersionEntry {
        VersionEntry {
            crawled_at: self.crawled_at,
            crawl_version: self.crawl_version.clone(),
            content_hash: self.content_hash.clone(),
        }
    }

    pub fn to_raw(&self) -> RawSnapshot {
        RawSnapshot {
            title: self.title.clone(),
            text: self.text.clone(),
            url: self.url.clone(),
            kind: self.kind,
            meta: self.meta(),
        }
    }

    pub fn to_current(&self) -> CanonicalContent {
        CanonicalContent {
            title: self.title.clone(),
            text: self.text.clone(),
            url: self.url.clone(),
        }
    }
}

impl CanonicalDocument {
    /// Creates the first canonical record for a url
    pub fn seed(doc: &IndexedDocument) -> Self {
        Self {
            current: doc.to_current(),
            meta: doc.meta(),
            version_history: vec![doc.version_entry()],
        }
    }

    /// Merges an incoming document into this record
    ///
    /// A history entry is appended only when the incoming hash differs from
    /// the stored `_meta.content_hash`. `current` and `_meta` are always
    /// overwritten.
    pub fn apply(&mut self, doc: &IndexedDocument) -> UpsertOutcome {
        let outcome = if self.meta.content_hash != doc.content_hash {
            self.version_history.push(doc.version_entry());
            UpsertOutcome::Appended
        } else {
            UpsertOutcome::Unchanged
        };

        self.current = doc.to_current();
        self.meta = doc.meta();
        outcome
    }
}

/// A document matched by a text search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub text: String,
}

/// A collection and how many documents it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub created_at: String,
    pub documents: u64,
}
