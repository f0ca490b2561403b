//! Single-page read/write against the index, with the dual-schema adapter
//! applied at the boundary and the save-side effects (status rollup,
//! file-server backup) orchestrated here.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::status::WorkStatusAggregator;
use super::BestEffort;
use crate::error::{Error, Result};
use crate::fileserver::{FileServerClient, PageSidecar};
use crate::index::{FilterExpr, IndexClient, SchemaManager, SearchQuery};
use crate::model::raw::{self, fields};
use crate::model::{HistoryEntry, Page};

/// Result of a page save: the page as written (history already prepended)
/// plus the outcomes of the two best-effort side effects, so the caller can
/// update UI state and show warnings without a re-read.
#[derive(Debug)]
pub struct SavedPage {
    pub page: Page,
    pub rollup: BestEffort,
    pub backup: BestEffort,
}

pub struct PageRepository {
    index: Arc<dyn IndexClient>,
    schema: Arc<SchemaManager>,
    aggregator: WorkStatusAggregator,
    fileserver: Option<Arc<FileServerClient>>,
}

impl PageRepository {
    pub fn new(
        index: Arc<dyn IndexClient>,
        schema: Arc<SchemaManager>,
        aggregator: WorkStatusAggregator,
        fileserver: Option<Arc<FileServerClient>>,
    ) -> Self {
        Self {
            index,
            schema,
            aggregator,
            fileserver,
        }
    }

    /// Fetch one page by work identifier (legacy slug or current short id)
    /// and 1-based page number. Absence is an expected outcome, not an
    /// error; callers must branch on `None`.
    pub async fn get_page(&self, work_id: &str, page_number: u32) -> Result<Option<Page>> {
        self.schema.ensure_ready().await;

        let mut query = SearchQuery::new("");
        query.filter = Some(FilterExpr::And(vec![
            FilterExpr::Or(vec![
                FilterExpr::eq(fields::WORK_ID, work_id),
                FilterExpr::eq(fields::WORK_ID_LEGACY, work_id),
            ]),
            FilterExpr::EqNum(fields::PAGE_NUMBER.into(), i64::from(page_number)),
        ]));
        query.limit = 2;

        let response = self
            .index
            .search(&query)
            .await
            .map_err(|e| Error::connectivity(self.index.host(), e))?;
        if response.hits.len() > 1 {
            // Page numbers are unique per work by ingestion; tolerate the
            // violation and take the first match.
            warn!(work_id, page_number, "multiple documents for one page");
        }
        match response.hits.first() {
            Some(hit) => raw::page_from_doc(&hit.document).map(Some),
            None => Ok(None),
        }
    }

    /// Persist a page edit. Prepends one history entry (the log is
    /// append-only, most recent first), writes a partial document update and
    /// waits for it, then recomputes the work rollup and backs the text up
    /// to the file server. Both side effects are best-effort; the index
    /// write is the system of record and is never rolled back.
    ///
    /// No version check is performed: concurrent editors are last-writer-
    /// wins, with the history log as the audit trail.
    pub async fn save_page(
        &self,
        mut page: Page,
        action_description: &str,
        user: &str,
        token: Option<&str>,
    ) -> Result<SavedPage> {
        self.schema.ensure_ready().await;

        page.history
            .insert(0, HistoryEntry::record(user, action_description));
        page.modified_at = Some(Utc::now());
        page.tags = raw::normalize_tags(std::mem::take(&mut page.tags));

        let doc = raw::page_to_partial_doc(&page)?;
        self.index
            .update_documents(&[doc])
            .await
            .map_err(|e| Error::connectivity(self.index.host(), e))?;
        debug!(page_id = %page.id, work_id = %page.work_id, "page saved to index");

        let rollup = self.aggregator.recompute_and_persist(&page.work_id).await;
        let backup = self.backup_page(&page, token).await;

        Ok(SavedPage {
            page,
            rollup,
            backup,
        })
    }

    /// Write the plain-text content and JSON sidecar to the file server,
    /// when the page carries enough information to locate its backing file.
    async fn backup_page(&self, page: &Page, token: Option<&str>) -> BestEffort {
        let (fileserver, token) = match (&self.fileserver, token) {
            (Some(fs), Some(token)) => (fs, token),
            _ => return BestEffort::Skipped,
        };
        let (path, _image) = match (&page.source_path, &page.image_url) {
            (Some(path), Some(image)) => (path, image),
            _ => return BestEffort::Skipped,
        };

        let filename = format!("{}_{}.txt", page.work_id, page.page_number);
        let sidecar = PageSidecar::from(page);
        match fileserver
            .save(token, path, &filename, &page.text, &sidecar)
            .await
        {
            Ok(()) => BestEffort::Ok,
            Err(err) => {
                warn!(page_id = %page.id, error = %err, "file server backup failed");
                BestEffort::Degraded(err.to_string())
            }
        }
    }
}
