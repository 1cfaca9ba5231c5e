/// Page state definitions for tracking a URL through one crawl run
///
/// `Queued -> Loading -> {Indexed | Failed} -> (pages only) LinksExpanded`.
/// Assets go straight from `Queued` to `Indexed`. `Skipped` is decided at
/// enqueue time, before a URL could ever reach `Loading`.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Admitted by the frontier and waiting for a worker
    Queued,

    /// A worker is loading the page
    Loading,

    /// Stored as a raw snapshot (and canonical document for pages)
    Indexed,

    // ===== Terminal States =====
    /// Loading or indexing failed; not retried again in this run
    Failed,

    /// Rejected at enqueue time (duplicate or domain quota exhausted)
    Skipped,

    /// Same-domain outbound links were handed to the frontier
    LinksExpanded,
}

impl PageState {
    /// Returns true if this is a terminal state
    ///
    /// `Indexed` is terminal for assets and for pages at maximum depth; a page
    /// below maximum depth continues to `LinksExpanded`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Indexed | Self::Failed | Self::Skipped | Self::LinksExpanded
        )
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Indexed | Self::LinksExpanded)
    }

    /// Returns true if moving from `self` to `next` follows the lifecycle
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Loading)
                | (Self::Queued, Self::Indexed)
                | (Self::Queued, Self::Failed)
                | (Self::Queued, Self::Skipped)
                | (Self::Loading, Self::Indexed)
                | (Self::Loading, Self::Failed)
                | (Self::Indexed, Self::LinksExpanded)
        )
    }

    /// Returns a short lowercase label for log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Loading => "loading",
            Self::Indexed => "indexed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::LinksExpanded => "links_expanded",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
