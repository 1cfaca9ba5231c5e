//! Offline import of pre-extracted documents
//!
//! Each `*.json` file in a directory holds `{url?, titulo?, texto?}` and is
//! indexed exactly like a crawled page: raw snapshot into the run's dated
//! collection, canonical upsert with the same hash rule. A file without a
//! `url` is keyed by its file name.

use crate::crawler::indexer::Indexer;
use crate::storage::IndexedDocument;
use crate::url::UrlKind;
use crate::CrawlError;
use chrono::Utc;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Shape of an importable file
#[derive(Debug, Default, Deserialize)]
struct ImportedFile {
    url: Option<String>,
    #[serde(default)]
    titulo: String,
    #[serde(default)]
    texto: String,
}

/// Outcome of an import run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Files that could not be read, decoded or indexed
    pub failed: Vec<PathBuf>,
}

/// Imports every `*.json` file in `dir`, in file name order
///
/// A bad file is logged and skipped; only a failure to list `dir` is an
/// error.
pub fn import_directory(indexer: &Indexer, dir: &Path) -> Result<ImportSummary, CrawlError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let crawl_version = indexer.names().crawl_version.clone();
    let mut summary = ImportSummary::default();

    for path in paths {
        match import_file(indexer, &path, &crawl_version) {
            Ok(()) => summary.imported += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping import file");
                summary.failed.push(path);
            }
        }
    }

    tracing::info!(
        imported = summary.imported,
        failed = summary.failed.len(),
        index = %indexer.names().raw,
        "import finished"
    );

    Ok(summary)
}

fn import_file(indexer: &Indexer, path: &Path, crawl_version: &str) -> Result<(), CrawlError> {
    let contents = std::fs::read_to_string(path)?;
    let file: ImportedFile = serde_json::from_str(&contents)?;

    let url = match file.url {
        Some(url) if !url.trim().is_empty() => url,
        _ => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let doc = IndexedDocument::new(
        url,
        file.titulo,
        file.texto,
        UrlKind::Page,
        crawl_version,
        Utc::now(),
    );
    indexer.index(&doc)
}
