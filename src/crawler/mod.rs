//! Crawler module for page loading, extraction and indexing
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier with per-domain dedup and quotas
//! - Loader sessions and the retrying page loader
//! - HTML extraction of title, text and links
//! - Workers, the indexer that feeds both document views, and the
//!   orchestration of a whole run
//! - Offline import of pre-extracted documents

mod coordinator;
pub mod events;
mod frontier;
mod import;
mod indexer;
mod loader;
mod parser;
mod retry;
mod session;
mod worker;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use frontier::{CrawlTarget, EnqueueOutcome, Frontier, QueueItem};
pub use import::{import_directory, ImportSummary};
pub use indexer::{snapshot_file_name, Indexer};
pub use loader::{LoadedPage, PageLoader};
pub use parser::{parse_html, ParsedPage};
pub use retry::{Attempts, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use session::{
    build_http_client, is_blocked_content_type, HttpSession, LoadError, PageSession, WaitUntil,
};
pub use worker::{CrawlCounters, CrawlTotals, Worker};
