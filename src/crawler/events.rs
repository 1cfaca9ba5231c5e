//! Names of the operational log events
//!
//! Every record carries one of these in its `event` field. Operator tooling
//! keys on the names, so existing ones must not change.

pub const PAGE_LOAD_ATTEMPT: &str = "page_load_attempt";
pub const PAGE_LOAD_ERROR: &str = "page_load_error";
pub const PAGE_LOAD_FAILED: &str = "page_load_failed";
pub const ASSET_DETECTED: &str = "asset_detected";
pub const CRAWL_START: &str = "crawl_start";
pub const PAGE_CRAWLED: &str = "page_crawled";
pub const INDEX_RAW_OK: &str = "index_raw_ok";
pub const INDEX_CANON_OK: &str = "index_canon_ok";
pub const WORKER_STARTED: &str = "worker_started";
pub const WORKER_STOPPED: &str = "worker_stopped";
pub const WORKER_ERROR: &str = "worker_error";
pub const CRAWL_INIT: &str = "crawl_init";
pub const CRAWL_DONE: &str = "crawl_done";

// Additive events
pub const INDEX_RAW_ERROR: &str = "index_raw_error";
pub const INDEX_CANON_ERROR: &str = "index_canon_error";
pub const SAVE_HTML_ERROR: &str = "save_html_error";
pub const ALIAS_MOVED: &str = "alias_moved";
pub const INDEX_ENSURED: &str = "index_ensured";
