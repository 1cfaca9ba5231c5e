//! Normativa crawler main entry point
//!
//! This is the command-line interface for the crawler and its versioned
//! document index.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use normativa_crawler::config::{load_config_with_hash, Config};
use normativa_crawler::crawler::Coordinator;
use normativa_crawler::output::{
    load_statistics, print_crawl_report, print_import_summary, print_search_results,
    print_statistics, search_current,
};
use normativa_crawler::storage::{DocumentStore, IndexNames, SqliteStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Normativa crawler: bounded crawling into a versioned document index
///
/// Crawls the configured seed sites, extracts their normative text and keeps
/// dated raw snapshots plus a canonical collection with change history.
#[derive(Parser, Debug)]
#[command(name = "normativa-crawler")]
#[command(version)]
#[command(about = "Bounded crawler feeding a versioned document index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Operational log format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    /// Crawl version label, overriding the config file (default: today's date)
    #[arg(long, value_name = "VERSION")]
    crawl_version: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "init_index", "import", "search"])]
    dry_run: bool,

    /// Show statistics from the index and exit
    #[arg(long, conflicts_with_all = ["dry_run", "init_index", "import", "search"])]
    stats: bool,

    /// Create the run's collections and publish the alias without crawling
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "import", "search"])]
    init_index: bool,

    /// Import a directory of JSON documents instead of crawling
    #[arg(long, value_name = "DIR", conflicts_with_all = ["dry_run", "stats", "init_index", "search"])]
    import: Option<PathBuf>,

    /// Search the published collection and exit
    #[arg(long, value_name = "TERM", conflicts_with_all = ["dry_run", "stats", "init_index", "import"])]
    search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// One JSON record per line
    Json,
    /// Human-readable lines
    Text,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.log_format);

    // Load and validate configuration
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!(
        path = %cli.config.display(),
        hash = %config_hash,
        "configuration loaded"
    );

    if let Some(version) = &cli.crawl_version {
        config
            .override_crawl_version(version)
            .context("invalid --crawl-version")?;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let store = open_store(&config)?;

    if cli.stats {
        handle_stats(&config, store.as_ref())
    } else if let Some(term) = &cli.search {
        handle_search(&config, store.as_ref(), term)
    } else if cli.init_index {
        handle_init_index(config, store)
    } else if let Some(dir) = &cli.import {
        handle_import(config, store, dir)
    } else {
        handle_crawl(config, store).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, format: LogFormat) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("normativa_crawler=info,warn"),
            1 => EnvFilter::new("normativa_crawler=debug,info"),
            2 => EnvFilter::new("normativa_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match format {
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .init(),
        LogFormat::Text => builder.init(),
    }
}

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let path = Path::new(&config.index.database_path);
    let store = SqliteStore::open(path)
        .with_context(|| format!("failed to open index database {}", path.display()))?;
    Ok(Arc::new(store))
}

fn index_names(config: &Config) -> IndexNames {
    IndexNames::new(&config.index.base, &config.crawl_version())
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    let names = index_names(config);

    println!("=== Normativa Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.concurrency);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!(
        "  Max pages per domain: {}",
        config.crawler.max_pages_per_domain
    );

    println!("\nLoader:");
    println!("  User agent: {}", config.loader.user_agent);
    println!(
        "  Navigation timeout: {}ms",
        config.loader.navigation_timeout_ms
    );
    println!("  Body timeout: {}ms", config.loader.body_timeout_ms);
    println!("  Backoff: {}ms per retry", config.loader.backoff_ms);

    println!("\nIndex:");
    println!("  Database: {}", config.index.database_path);
    println!("  Crawl version: {}", names.crawl_version);
    println!("  Raw collection: {}", names.raw);
    println!("  Canonical collection: {}", names.canonical);
    println!("  Alias: {}", names.alias);
    match &config.index.snapshot_dir {
        Some(dir) => println!("  HTML snapshots: {}", dir.display()),
        None => println!("  HTML snapshots: disabled"),
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the index
fn handle_stats(config: &Config, store: &dyn DocumentStore) -> anyhow::Result<()> {
    println!("Database: {}\n", config.index.database_path);

    let stats = load_statistics(store, &index_names(config))?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --search mode: queries through the alias
fn handle_search(config: &Config, store: &dyn DocumentStore, term: &str) -> anyhow::Result<()> {
    let names = index_names(config);
    let hits = search_current(store, &names.alias, term)
        .with_context(|| format!("search through {} failed", names.alias))?;
    print_search_results(term, &hits);
    Ok(())
}

/// Handles the --init-index mode: prepares collections and publishes the alias
fn handle_init_index(config: Config, store: Arc<dyn DocumentStore>) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config, store);
    coordinator.init_index()?;

    let names = coordinator.names();
    println!("✓ Collections ready: {}, {}", names.raw, names.canonical);
    println!("✓ Alias {} -> {}", names.alias, names.raw);
    Ok(())
}

/// Handles the --import mode: indexes pre-extracted JSON documents
fn handle_import(config: Config, store: Arc<dyn DocumentStore>, dir: &Path) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config, store);
    let summary = coordinator
        .import(dir)
        .with_context(|| format!("import from {} failed", dir.display()))?;

    let names = coordinator.names();
    print_import_summary(&names.raw, &names.canonical, &summary);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, store: Arc<dyn DocumentStore>) -> anyhow::Result<()> {
    tracing::info!(
        seeds = config.seeds.len(),
        workers = config.crawler.concurrency,
        "starting crawl"
    );

    let coordinator = Coordinator::new(config, store);
    match coordinator.run().await {
        Ok(report) => {
            print_crawl_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "crawl failed");
            Err(e.into())
        }
    }
}
