//! URL frontier shared by all workers
//!
//! This module handles:
//! - The pending-work queue of (url, depth) pairs
//! - Per-domain dedup and quota bookkeeping (the DomainState table)
//! - Tracking outstanding work so the orchestrator can wait for a full drain
//! - Delivering one shutdown token per worker once the run is over

use crate::state::{Admission, DomainState};
use crate::url::{clean_url, extract_domain};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use url::Url;

/// A url waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// The cleaned URL
    pub url: Url,

    /// Distance from the seeds; seeds are depth 1
    pub depth: u32,
}

/// What a worker receives from the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueItem {
    Crawl(CrawlTarget),
    /// Poison pill: the worker receiving it must stop
    Shutdown,
}

/// Result of an enqueue request
///
/// None of these are errors; rejected urls are simply not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    Duplicate,
    QuotaExceeded,
    Malformed,
}

/// Thread-safe frontier with per-domain state
///
/// The DomainState table is only ever touched under its lock, and the lock
/// is held just for the check-and-set of one url.
pub struct Frontier {
    max_pages_per_domain: u32,
    domains: Mutex<HashMap<String, DomainState>>,
    sender: mpsc::UnboundedSender<QueueItem>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<QueueItem>>,
    /// Queued plus in-flight targets
    outstanding: watch::Sender<usize>,
}

impl Frontier {
    pub fn new(max_pages_per_domain: u32) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (outstanding, _) = watch::channel(0);

        Self {
            max_pages_per_domain,
            domains: Mutex::new(HashMap::new()),
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
            outstanding,
        }
    }

    fn domains(&self) -> MutexGuard<'_, HashMap<String, DomainState>> {
        // the table stays consistent even if a holder panicked: admit() is a
        // single check-and-set
        self.domains.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cleans `url` and queues it at `depth` if its domain admits it
    ///
    /// Fragment and query are stripped first, so variants of one url share a
    /// single identity. A url without a resolvable domain is dropped as
    /// [`EnqueueOutcome::Malformed`]. Once admitted, a url is never queued
    /// again in this run.
    pub fn enqueue(&self, url: &str, depth: u32) -> EnqueueOutcome {
        let Ok(url) = clean_url(url) else {
            return EnqueueOutcome::Malformed;
        };
        let Some(domain) = extract_domain(&url) else {
            return EnqueueOutcome::Malformed;
        };

        let admission = self
            .domains()
            .entry(domain.clone())
            .or_insert_with(|| DomainState::new(domain))
            .admit(url.as_str(), self.max_pages_per_domain);

        match admission {
            Admission::Admitted => {}
            Admission::Duplicate => return EnqueueOutcome::Duplicate,
            Admission::QuotaExceeded => return EnqueueOutcome::QuotaExceeded,
        }

        // counted before it becomes visible, so a drain can't be observed early
        self.outstanding.send_modify(|n| *n += 1);
        if self
            .sender
            .send(QueueItem::Crawl(CrawlTarget { url, depth }))
            .is_err()
        {
            self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
        }

        EnqueueOutcome::Queued
    }

    /// Waits for the next item
    ///
    /// Blocks until a target or a shutdown token is available.
    pub async fn dequeue(&self) -> QueueItem {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await.unwrap_or(QueueItem::Shutdown)
    }

    /// Marks one dequeued target as fully processed
    ///
    /// Must be called after any urls discovered while processing it have
    /// been enqueued.
    pub fn task_done(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Number of targets queued or in flight
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Resolves once no target is queued or in flight
    pub async fn wait_drained(&self) {
        let mut watcher = self.outstanding.subscribe();
        // the sender lives as long as self, so this can't fail
        let _ = watcher.wait_for(|n| *n == 0).await;
    }

    /// Queues one shutdown token per worker
    pub fn shutdown(&self, workers: usize) {
        for _ in 0..workers {
            let _ = self.sender.send(QueueItem::Shutdown);
        }
    }

    /// Returns every domain seen this run, sorted
    pub fn domains_seen(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.domains().keys().cloned().collect();
        domains.sort();
        domains
    }

    /// Counts one indexed page for `domain` and returns the domain's total
    pub fn record_crawled(&self, domain: &str) -> u32 {
        self.domains()
            .get_mut(domain)
            .map(DomainState::record_crawled)
            .unwrap_or(0)
    }

    /// Returns a copy of one domain's state
    pub fn domain_state(&self, domain: &str) -> Option<DomainState> {
        self.domains().get(domain).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn target(item: QueueItem) -> CrawlTarget {
        match item {
            QueueItem::Crawl(target) => target,
            QueueItem::Shutdown => panic!("expected a crawl target"),
        }
    }

    #[tokio::test]
    async fn test_enqueue_cleans_url() {
        let frontier = Frontier::new(10);
        assert_eq!(
            frontier.enqueue("https://Example.test/ley?page=2#art-3", 1),
            EnqueueOutcome::Queued
        );

        let queued = target(frontier.dequeue().await);
        assert_eq!(queued.url.as_str(), "https://example.test/ley");
        assert_eq!(queued.depth, 1);
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let frontier = Frontier::new(10);
        assert_eq!(frontier.enqueue("https://example.test/a", 1), EnqueueOutcome::Queued);
        assert_eq!(
            frontier.enqueue("https://example.test/a#otra", 2),
            EnqueueOutcome::Duplicate
        );
        assert_eq!(
            frontier.enqueue("https://example.test/a?x=1", 1),
            EnqueueOutcome::Duplicate
        );
        assert_eq!(frontier.outstanding(), 1);
    }

    #[test]
    fn test_quota_is_never_exceeded() {
        let frontier = Frontier::new(3);
        let outcomes: Vec<_> = (0..10)
            .map(|i| frontier.enqueue(&format!("https://example.test/p{}", i), 1))
            .collect();

        assert_eq!(
            outcomes.iter().filter(|o| **o == EnqueueOutcome::Queued).count(),
            3
        );
        assert!(outcomes[3..]
            .iter()
            .all(|o| *o == EnqueueOutcome::QuotaExceeded));
        assert_eq!(frontier.domain_state("example.test").unwrap().page_count, 3);

        // another domain has its own quota
        assert_eq!(frontier.enqueue("https://other.test/", 1), EnqueueOutcome::Queued);
    }

    #[test]
    fn test_malformed_urls_are_dropped() {
        let frontier = Frontier::new(10);
        assert_eq!(frontier.enqueue("not a url", 1), EnqueueOutcome::Malformed);
        assert_eq!(frontier.enqueue("mailto:a@b.test", 1), EnqueueOutcome::Malformed);
        assert_eq!(frontier.enqueue("file:///etc/passwd", 1), EnqueueOutcome::Malformed);
        assert_eq!(frontier.outstanding(), 0);
        assert!(frontier.domains_seen().is_empty());
    }

    #[test]
    fn test_concurrent_enqueue_respects_quota() {
        let frontier = Arc::new(Frontier::new(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let frontier = frontier.clone();
                std::thread::spawn(move || {
                    for i in 0..40 {
                        // threads overlap on half of their urls
                        let n = (t / 2) * 40 + i;
                        frontier.enqueue(&format!("https://example.test/doc/{}", n), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let state = frontier.domain_state("example.test").unwrap();
        assert_eq!(state.page_count, 50);
        assert_eq!(state.visited.len(), 50);
        assert_eq!(frontier.outstanding(), 50);
    }

    #[tokio::test]
    async fn test_drain_waits_for_task_done() {
        let frontier = Arc::new(Frontier::new(10));
        frontier.enqueue("https://example.test/", 1);

        let item = frontier.dequeue().await;
        assert!(matches!(item, QueueItem::Crawl(_)));

        let drained = tokio::spawn({
            let frontier = frontier.clone();
            async move { frontier.wait_drained().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!drained.is_finished());

        frontier.task_done();
        tokio::time::timeout(Duration::from_secs(1), drained)
            .await
            .expect("drain should complete")
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_tokens_follow_work() {
        let frontier = Frontier::new(10);
        frontier.enqueue("https://example.test/", 1);
        frontier.shutdown(2);

        assert!(matches!(frontier.dequeue().await, QueueItem::Crawl(_)));
        assert_eq!(frontier.dequeue().await, QueueItem::Shutdown);
        assert_eq!(frontier.dequeue().await, QueueItem::Shutdown);
    }

    #[test]
    fn test_domains_seen_sorted() {
        let frontier = Frontier::new(10);
        frontier.enqueue("https://zeta.test/", 1);
        frontier.enqueue("https://alfa.test/", 1);
        assert_eq!(
            frontier.domains_seen(),
            vec!["alfa.test".to_string(), "zeta.test".to_string()]
        );
    }
}
