//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the orchestration of one crawl run, including:
//! - Preparing the run's raw and canonical collections
//! - Starting the worker pool, one loader session per worker
//! - Seeding the frontier and waiting for it to drain
//! - Shutting workers down and publishing the run through the alias

use crate::config::Config;
use crate::crawler::events;
use crate::crawler::frontier::Frontier;
use crate::crawler::import::{import_directory, ImportSummary};
use crate::crawler::indexer::Indexer;
use crate::crawler::loader::PageLoader;
use crate::crawler::session::{HttpSession, PageSession};
use crate::crawler::worker::{CrawlCounters, CrawlTotals, Worker};
use crate::storage::{DocumentStore, IndexNames, SqliteStore};
use crate::CrawlError;
use std::path::Path;
use std::sync::Arc;

/// What a finished run reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Every domain that had at least one url admitted, sorted
    pub domains: Vec<String>,
    pub totals: CrawlTotals,
    pub raw_index: String,
    pub canonical_index: String,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    store: Arc<dyn DocumentStore>,
    names: IndexNames,
}

impl Coordinator {
    /// Creates a coordinator for one run
    ///
    /// The collection names are fixed here from the configured base and the
    /// run's crawl version.
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        let names = IndexNames::new(&config.index.base, &config.crawl_version());
        Self {
            config: Arc::new(config),
            store,
            names,
        }
    }

    pub fn names(&self) -> &IndexNames {
        &self.names
    }

    /// Ensures the raw and canonical collections exist
    pub fn prepare_indices(&self) -> Result<(), CrawlError> {
        for name in [&self.names.raw, &self.names.canonical] {
            let created = self.store.ensure_index(name)?;
            tracing::info!(
                event = events::INDEX_ENSURED,
                index = %name,
                created,
                "index ready"
            );
        }
        Ok(())
    }

    /// Points the alias at this run's raw collection
    pub fn publish(&self) -> Result<(), CrawlError> {
        self.store.move_alias(&self.names.alias, &self.names.raw)?;
        tracing::info!(
            event = events::ALIAS_MOVED,
            alias = %self.names.alias,
            index = %self.names.raw,
            "alias repointed"
        );
        Ok(())
    }

    /// Prepares the collections and publishes the raw one, without crawling
    pub fn init_index(&self) -> Result<(), CrawlError> {
        self.prepare_indices()?;
        self.publish()
    }

    /// Imports a directory of JSON documents into this run's collections
    pub fn import(&self, dir: &Path) -> Result<ImportSummary, CrawlError> {
        self.prepare_indices()?;
        let indexer = Indexer::new(self.store.clone(), self.names.clone());
        import_directory(&indexer, dir)
    }

    /// Runs the crawl with one HTTP session per worker
    pub async fn run(&self) -> Result<CrawlReport, CrawlError> {
        let loader_config = self.config.loader.clone();
        self.run_with(move |_| Ok(HttpSession::from_config(&loader_config)?))
            .await
    }

    /// Runs the crawl, building each worker's session with `make_session`
    ///
    /// # Run Flow
    ///
    /// 1. Ensure both collections exist (fatal on failure)
    /// 2. Build every worker's session (fatal on failure)
    /// 3. Seed the frontier at depth 1 and start the workers
    /// 4. Wait until nothing is queued or in flight
    /// 5. Send one shutdown token per worker and join them all
    /// 6. Repoint the alias to this run's raw collection
    pub async fn run_with<S, F>(&self, mut make_session: F) -> Result<CrawlReport, CrawlError>
    where
        S: PageSession + 'static,
        F: FnMut(usize) -> Result<S, CrawlError>,
    {
        tracing::info!(
            event = events::CRAWL_INIT,
            seeds = ?self.config.seeds,
            raw_index = %self.names.raw,
            canon_index = %self.names.canonical,
            "crawl starting"
        );

        self.prepare_indices()?;

        let mut indexer = Indexer::new(self.store.clone(), self.names.clone());
        if let Some(dir) = &self.config.index.snapshot_dir {
            tokio::fs::create_dir_all(dir).await?;
            indexer = indexer.with_snapshot_dir(dir);
        }
        let indexer = Arc::new(indexer);

        let frontier = Arc::new(Frontier::new(self.config.crawler.max_pages_per_domain));
        let counters = Arc::new(CrawlCounters::default());

        let mut workers = Vec::with_capacity(self.config.crawler.concurrency as usize);
        for id in 0..self.config.crawler.concurrency as usize {
            let loader = PageLoader::new(make_session(id)?, &self.config.loader);
            workers.push(Worker::new(
                id,
                loader,
                frontier.clone(),
                indexer.clone(),
                counters.clone(),
                self.config.crawler.max_depth,
            ));
        }

        for seed in &self.config.seeds {
            frontier.enqueue(seed, 1);
        }

        let handles: Vec<_> = workers
            .into_iter()
            .map(|worker| tokio::spawn(worker.run()))
            .collect();

        frontier.wait_drained().await;
        frontier.shutdown(handles.len());

        for (worker_id, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                let err = CrawlError::Worker {
                    worker_id,
                    message: e.to_string(),
                };
                tracing::error!(
                    event = events::WORKER_ERROR,
                    worker_id,
                    error = %err,
                    "worker did not stop cleanly"
                );
            }
        }

        self.publish()?;

        let report = CrawlReport {
            domains: frontier.domains_seen(),
            totals: counters.totals(),
            raw_index: self.names.raw.clone(),
            canonical_index: self.names.canonical.clone(),
        };

        tracing::info!(
            event = events::CRAWL_DONE,
            domains = ?report.domains,
            pages_indexed = report.totals.pages_indexed,
            assets_indexed = report.totals.assets_indexed,
            failed = report.totals.failed,
            "crawl finished"
        );

        Ok(report)
    }
}

/// Runs a complete crawl from a configuration
///
/// Opens the SQLite store named in the configuration and runs one crawl
/// with HTTP sessions.
///
/// # Example
///
/// ```no_run
/// # use normativa_crawler::config::load_config;
/// # use normativa_crawler::crawler::run_crawl;
/// # use std::path::Path;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawler.toml"))?;
/// let report = run_crawl(config).await?;
/// println!("touched {} domains", report.domains.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport, CrawlError> {
    let store = SqliteStore::open(Path::new(&config.index.database_path))?;
    Coordinator::new(config, Arc::new(store)).run().await
}
