//! URL handling module
//!
//! This module provides URL cleaning, domain extraction and the asset
//! classifier that decides whether a URL is loaded as a page or indexed by
//! identity only.

mod domain;
mod normalize;

use serde::{Deserialize, Serialize};
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, same_domain};
pub use normalize::clean_url;

/// File extensions that mark a URL as a downloadable asset
pub const ASSET_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".7z", ".tar",
    ".gz",
];

/// What kind of resource a URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    /// An HTML page - loaded, extracted and scanned for links
    Page,
    /// A document download - indexed by identity, never loaded
    Asset,
}

impl UrlKind {
    /// Returns the value stored in a document's `tipo` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Asset => "asset",
        }
    }
}

/// Classifies a URL as a page or an asset
///
/// The decision only looks at the (case-insensitive) path suffix; query and
/// fragment never influence it.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use normativa_crawler::url::{classify, UrlKind};
///
/// let pdf = Url::parse("https://x.test/doc.pdf").unwrap();
/// assert_eq!(classify(&pdf), UrlKind::Asset);
///
/// let page = Url::parse("https://x.test/normas").unwrap();
/// assert_eq!(classify(&page), UrlKind::Page);
/// ```
pub fn classify(url: &Url) -> UrlKind {
    let path = url.path().to_lowercase();
    if ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        UrlKind::Asset
    } else {
        UrlKind::Page
    }
}
