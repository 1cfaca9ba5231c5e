//! Text search through the published alias

use crate::storage::{DocumentStore, SearchHit};
use crate::CrawlError;

/// Maximum number of results shown
pub const SEARCH_LIMIT: usize = 10;

/// Characters of context kept around a match
const SNIPPET_CHARS: usize = 150;

/// Searches the collection behind `alias` for `term`
///
/// Fails with an alias error when nothing has been published yet.
pub fn search_current(
    store: &dyn DocumentStore,
    alias: &str,
    term: &str,
) -> Result<Vec<SearchHit>, CrawlError> {
    store.resolve_alias(alias)?;
    Ok(store.search(alias, term, SEARCH_LIMIT)?)
}

/// Returns up to [`SNIPPET_CHARS`] characters of `text` around the first
/// case-insensitive occurrence of `term`
///
/// Falls back to the start of the text when the term only matched the title.
pub fn snippet(text: &str, term: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let lower: Vec<char> = text.to_lowercase().chars().collect();
    let needle: Vec<char> = term.to_lowercase().chars().collect();

    // lowercasing can change the length of some characters; only trust the
    // match position when it did not
    let found = if lower.len() == chars.len() && !needle.is_empty() {
        lower
            .windows(needle.len())
            .position(|window| window == needle.as_slice())
    } else {
        None
    };

    let start = found
        .map(|pos| pos.saturating_sub(SNIPPET_CHARS / 3))
        .unwrap_or(0);
    let end = (start + SNIPPET_CHARS).min(chars.len());

    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push_str("...");
    }
    out
}

/// Prints search hits to stdout
pub fn print_search_results(term: &str, hits: &[SearchHit]) {
    println!("Results for \"{}\": {}", term, hits.len());
    println!("{}", "=".repeat(50));

    for hit in hits {
        let title = if hit.title.is_empty() {
            "(untitled)"
        } else {
            hit.title.as_str()
        };
        println!("- {}\n  URL: {}", title, hit.id);
        if !hit.text.is_empty() {
            println!("  >> {}", snippet(&hit.text, term));
        }
        println!("{}", "-".repeat(50));
    }
}
