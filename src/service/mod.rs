//! Services between the UI and the search index: dashboard work listing,
//! full-text content search, page persistence and the derived work-status
//! rollup.

pub mod content;
pub mod pages;
pub mod status;
pub mod works;

pub use content::{ContentHit, ContentQuery, ContentResults, ContentService, SearchScope};
pub use pages::{PageRepository, SavedPage};
pub use status::{compute_rollup, WorkStatusAggregator};
pub use works::{SortKey, WorkFilter, WorkListRequest, WorksService};

/// Outcome of a side effect that must never fail the primary operation:
/// the file-server backup and the status-rollup broadcast. `Degraded`
/// carries the reason so the UI can show a non-blocking warning and tests
/// can assert on the degraded path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort {
    Ok,
    /// Side effect skipped because its preconditions were not met (for a
    /// backup: no source path or image reference on the page).
    Skipped,
    Degraded(String),
}

impl BestEffort {
    pub fn is_degraded(&self) -> bool {
        matches!(self, BestEffort::Degraded(_))
    }
}
