use std::collections::HashSet;

/// Outcome of asking a domain to admit a URL into the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The URL was unseen and under quota; it is now marked visited
    Admitted,
    /// The URL was already admitted earlier in this run
    Duplicate,
    /// The domain has already admitted its maximum number of pages
    QuotaExceeded,
}

/// Tracks the state of a domain during crawling
///
/// One instance exists per discovered domain, created on the first enqueue
/// for that domain and owned by the frontier for the whole run.
#[derive(Debug, Clone)]
pub struct DomainState {
    /// Lowercase host this state belongs to
    pub domain: String,

    /// Every URL admitted for this domain in the current run
    pub visited: HashSet<String>,

    /// Number of URLs admitted for this domain, never above the configured cap
    pub page_count: u32,

    /// Number of pages loaded and indexed so far
    pub pages_crawled: u32,
}

impl DomainState {
    /// Creates a new DomainState with no visited URLs
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            visited: HashSet::new(),
            page_count: 0,
            pages_crawled: 0,
        }
    }

    /// Checks and records a URL in one step
    ///
    /// A duplicate is reported before the quota is considered, so a URL that
    /// was already admitted never counts against the cap twice.
    ///
    /// # Arguments
    ///
    /// * `url` - The cleaned URL string
    /// * `max_pages` - Per-domain cap on admitted URLs
    pub fn admit(&mut self, url: &str, max_pages: u32) -> Admission {
        if self.visited.contains(url) {
            return Admission::Duplicate;
        }

        if self.has_exceeded_limit(max_pages) {
            return Admission::QuotaExceeded;
        }

        self.visited.insert(url.to_string());
        self.page_count += 1;
        Admission::Admitted
    }

    /// Checks if this domain has reached its page cap
    pub fn has_exceeded_limit(&self, max_pages: u32) -> bool {
        self.page_count >= max_pages
    }

    /// Records one more indexed page and returns the new total
    pub fn record_crawled(&mut self) -> u32 {
        self.pages_crawled += 1;
        self.pages_crawled
    }
}
