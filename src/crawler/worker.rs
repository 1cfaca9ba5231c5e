//! Crawl workers
//!
//! A worker owns one page loader session and repeatedly takes targets from
//! the frontier until it receives a shutdown token. A url that fails is
//! logged and counted; the worker then moves on to its next target.

use crate::crawler::events;
use crate::crawler::frontier::{CrawlTarget, Frontier, QueueItem};
use crate::crawler::indexer::Indexer;
use crate::crawler::loader::PageLoader;
use crate::crawler::session::PageSession;
use crate::state::PageState;
use crate::storage::IndexedDocument;
use crate::url::{classify, extract_domain, same_domain, UrlKind};
use crate::CrawlError;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Run-wide tallies shared by all workers
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pages_indexed: AtomicU64,
    assets_indexed: AtomicU64,
    failed: AtomicU64,
}

/// A point-in-time copy of [`CrawlCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlTotals {
    pub pages_indexed: u64,
    pub assets_indexed: u64,
    pub failed: u64,
}

impl CrawlCounters {
    fn record(&self, state: PageState, kind: UrlKind) {
        let counter = match (state, kind) {
            (PageState::Failed, _) => &self.failed,
            (_, UrlKind::Asset) => &self.assets_indexed,
            (_, UrlKind::Page) => &self.pages_indexed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn totals(&self) -> CrawlTotals {
        CrawlTotals {
            pages_indexed: self.pages_indexed.load(Ordering::Relaxed),
            assets_indexed: self.assets_indexed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// One member of the worker pool
pub struct Worker<S> {
    id: usize,
    loader: PageLoader<S>,
    frontier: Arc<Frontier>,
    indexer: Arc<Indexer>,
    counters: Arc<CrawlCounters>,
    max_depth: u32,
}

impl<S: PageSession> Worker<S> {
    pub fn new(
        id: usize,
        loader: PageLoader<S>,
        frontier: Arc<Frontier>,
        indexer: Arc<Indexer>,
        counters: Arc<CrawlCounters>,
        max_depth: u32,
    ) -> Self {
        Self {
            id,
            loader,
            frontier,
            indexer,
            counters,
            max_depth,
        }
    }

    /// Processes targets until a shutdown token arrives
    pub async fn run(mut self) {
        tracing::info!(
            event = events::WORKER_STARTED,
            worker_id = self.id,
            "worker started"
        );

        loop {
            let target = match self.frontier.dequeue().await {
                QueueItem::Crawl(target) => target,
                QueueItem::Shutdown => break,
            };

            let kind = classify(&target.url);
            match self.process(&target).await {
                Ok(state) => self.counters.record(state, kind),
                Err(e) => {
                    tracing::error!(
                        event = events::WORKER_ERROR,
                        worker_id = self.id,
                        url = %target.url,
                        error = %e,
                        "failed to process url"
                    );
                    self.counters.record(PageState::Failed, kind);
                }
            }

            self.frontier.task_done();
        }

        tracing::info!(
            event = events::WORKER_STOPPED,
            worker_id = self.id,
            "worker stopped"
        );
    }

    /// Takes one target through its lifecycle and returns its final state
    ///
    /// A load failure ends in [`PageState::Failed`] without an error: it has
    /// already been logged by the loader. Store failures are returned.
    pub async fn process(&mut self, target: &CrawlTarget) -> Result<PageState, CrawlError> {
        let url = &target.url;
        let domain = extract_domain(url).unwrap_or_default();
        let crawl_version = self.indexer.names().crawl_version.clone();
        let mut state = PageState::Queued;

        tracing::info!(
            event = events::CRAWL_START,
            url = %url,
            depth = target.depth,
            domain = %domain,
            "crawling url"
        );

        if classify(url) == UrlKind::Asset {
            tracing::info!(
                event = events::ASSET_DETECTED,
                url = %url,
                domain = %domain,
                "asset indexed without loading"
            );
            let doc = IndexedDocument::asset(url.as_str(), crawl_version, Utc::now());
            self.indexer.index(&doc)?;
            return advance(state, PageState::Indexed);
        }

        state = advance(state, PageState::Loading)?;
        let page = match self.loader.load(url).await {
            Ok(page) => page,
            Err(_) => return advance(state, PageState::Failed),
        };

        self.indexer.save_snapshot(url, &page.html).await;

        let doc = IndexedDocument::new(
            url.as_str(),
            page.title,
            page.text,
            UrlKind::Page,
            crawl_version,
            Utc::now(),
        );
        self.indexer.index(&doc)?;
        state = advance(state, PageState::Indexed)?;

        let pages = self.frontier.record_crawled(&domain);
        tracing::info!(
            event = events::PAGE_CRAWLED,
            url = %url,
            depth = target.depth,
            domain = %domain,
            pages,
            "page crawled"
        );

        if target.depth >= self.max_depth {
            return Ok(state);
        }

        for link in page.links.iter().filter(|link| same_domain(link, url)) {
            self.frontier.enqueue(link.as_str(), target.depth + 1);
        }
        advance(state, PageState::LinksExpanded)
    }
}

fn advance(from: PageState, to: PageState) -> Result<PageState, CrawlError> {
    if from.can_transition_to(to) {
        Ok(to)
    } else {
        Err(CrawlError::InvalidTransition { from, to })
    }
}
