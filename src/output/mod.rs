//! Output module for operator-facing reports
//!
//! This module handles:
//! - Printing the completion report of a crawl or import run
//! - Index statistics (collections, alias, canonical history)
//! - Search results read through the published alias

pub mod search;
pub mod stats;

pub use search::{print_search_results, search_current, snippet, SEARCH_LIMIT};
pub use stats::{load_statistics, print_statistics, IndexStatistics};

use crate::crawler::{CrawlReport, ImportSummary};

/// Prints the completion report of a crawl run
///
/// # Arguments
///
/// * `report` - The report returned by the coordinator
pub fn print_crawl_report(report: &CrawlReport) {
    println!("=== Crawl Complete ===\n");

    println!("Collections:");
    println!("  Raw snapshots: {}", report.raw_index);
    println!("  Canonical: {}", report.canonical_index);
    println!();

    println!("Totals:");
    println!("  Pages indexed: {}", report.totals.pages_indexed);
    println!("  Assets indexed: {}", report.totals.assets_indexed);
    println!("  Failed urls: {}", report.totals.failed);
    println!();

    println!("Domains touched ({}):", report.domains.len());
    for domain in &report.domains {
        println!("  - {}", domain);
    }
}

/// Prints the outcome of an offline import
pub fn print_import_summary(raw_index: &str, canonical_index: &str, summary: &ImportSummary) {
    println!(
        "Imported {} documents into '{}' and '{}'",
        summary.imported, raw_index, canonical_index
    );
    if !summary.failed.is_empty() {
        println!("Skipped {} files:", summary.failed.len());
        for path in &summary.failed {
            println!("  - {}", path.display());
        }
    }
}
