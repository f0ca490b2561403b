//! Derived work-level status.
//!
//! Dashboard filters need a per-work status without scanning every page at
//! query time, so the rollup is denormalized onto each sibling page document
//! and recomputed after every page save. An inconsistent rollup is a
//! degraded state, not data loss: the next save to any page of the work
//! recomputes it.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use super::BestEffort;
use crate::error::Result;
use crate::index::{FilterExpr, IndexClient, SearchQuery};
use crate::model::raw::{self, fields};
use crate::model::{PageStatus, WorkStatus};

/// 3-way rollup over page statuses. Pure and order-independent.
///
/// Empty and all-raw collapse to `Raw`; a work is `Done` only when every
/// page is; anything mixed is `InProgress`. The finer five-value page enum
/// is deliberately not rolled up further.
pub fn compute_rollup(statuses: &[PageStatus]) -> WorkStatus {
    if statuses.is_empty() || statuses.iter().all(|s| *s == PageStatus::Raw) {
        return WorkStatus::Raw;
    }
    if statuses.iter().all(|s| *s == PageStatus::Done) {
        return WorkStatus::Done;
    }
    WorkStatus::InProgress
}

pub struct WorkStatusAggregator {
    index: Arc<dyn IndexClient>,
    max_pages_per_work: usize,
}

impl WorkStatusAggregator {
    pub fn new(index: Arc<dyn IndexClient>, max_pages_per_work: usize) -> Self {
        Self {
            index,
            max_pages_per_work,
        }
    }

    /// Recompute the rollup across all pages of `work_id` and write it to
    /// every sibling document in one batch. Best-effort: failures are
    /// logged and reported, never propagated.
    pub async fn recompute_and_persist(&self, work_id: &str) -> BestEffort {
        match self.try_recompute(work_id).await {
            Ok(()) => BestEffort::Ok,
            Err(err) => {
                warn!(work_id, error = %err, "work status rollup failed");
                BestEffort::Degraded(err.to_string())
            }
        }
    }

    async fn try_recompute(&self, work_id: &str) -> Result<()> {
        let mut query = SearchQuery::new("");
        query.filter = Some(FilterExpr::Or(vec![
            FilterExpr::eq(fields::WORK_ID, work_id),
            FilterExpr::eq(fields::WORK_ID_LEGACY, work_id),
        ]));
        query.limit = self.max_pages_per_work;
        let response = self.index.search(&query).await?;
        if response.hits.is_empty() {
            return Ok(());
        }

        let statuses: Vec<PageStatus> = response
            .hits
            .iter()
            .map(|hit| {
                hit.document
                    .as_object()
                    .and_then(|map| raw::read_field(map, "status"))
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default()
            })
            .collect();
        let rollup = compute_rollup(&statuses);

        let updates: Vec<serde_json::Value> = response
            .hits
            .iter()
            .filter_map(|hit| hit.string_field(fields::ID))
            .map(|id| json!({ "id": id, "work_status": rollup }))
            .collect();
        self.index.update_documents(&updates).await
    }
}
