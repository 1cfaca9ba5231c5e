use crate::config::validate_crawl_version;
use crate::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Start URLs, enqueued at depth 1
    pub seeds: Vec<String>,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    pub index: IndexConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of parallel workers, each with its own loader session
    pub concurrency: u32,

    /// Maximum depth to crawl; seeds sit at depth 1
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of URLs admitted per domain in one run
    #[serde(rename = "max-pages-per-domain")]
    pub max_pages_per_domain: u32,
}

/// Page loader configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Upper bound on one navigation attempt (milliseconds)
    #[serde(
        rename = "navigation-timeout-ms",
        default = "default_navigation_timeout_ms"
    )]
    pub navigation_timeout_ms: u64,

    /// Upper bound on the explicit wait for the document body (milliseconds)
    #[serde(rename = "body-timeout-ms", default = "default_body_timeout_ms")]
    pub body_timeout_ms: u64,

    /// Base backoff between attempts; attempt n waits n times this (milliseconds)
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Base name shared by the raw, canonical and alias collections
    #[serde(default = "default_base")]
    pub base: String,

    /// Crawl version label; defaults to today's ISO date
    #[serde(rename = "crawl-version", default)]
    pub crawl_version: Option<String>,

    /// Directory for HTML snapshots of loaded pages
    #[serde(rename = "snapshot-dir", default)]
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            body_timeout_ms: default_body_timeout_ms(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Config {
    /// Returns the crawl version for this run
    ///
    /// Uses the configured value when present, otherwise the local calendar
    /// date in ISO form (`YYYY-MM-DD`).
    pub fn crawl_version(&self) -> String {
        self.index
            .crawl_version
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string())
    }

    /// Replaces the configured crawl version, validating the new label
    pub fn override_crawl_version(&mut self, version: &str) -> Result<(), ConfigError> {
        validate_crawl_version(version)?;
        self.index.crawl_version = Some(version.to_string());
        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("normativa-crawler/{}", env!("CARGO_PKG_VERSION"))
}

fn default_navigation_timeout_ms() -> u64 {
    15_000
}

fn default_body_timeout_ms() -> u64 {
    8_000
}

fn default_backoff_ms() -> u64 {
    1_000
}

fn default_base() -> String {
    "normativa".to_string()
}
