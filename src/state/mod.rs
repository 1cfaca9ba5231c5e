//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: Lifecycle of a single URL within one run
//! - `DomainState`: Per-domain visited set and page quota, owned by the frontier

mod domain_state;
mod page_state;

// Re-export main types
pub use domain_state::{Admission, DomainState};
pub use page_state::PageState;
