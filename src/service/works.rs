//! Dashboard work listing: one row per work, filterable and sortable.
//!
//! The index stores pages, not works, so "list works" is really "list pages,
//! one per work". Two index limitations shape the strategy here. First,
//! server-side distinct collapses duplicates by an arbitrary tie-break,
//! which destroys relevance order; relevance queries therefore run without
//! distinct and are de-duplicated client-side, keeping the first (highest
//! ranked) hit per work. Second, distinct combined with a secondary sort is
//! not reliable, so every non-relevance result set is re-sorted client-side
//! as an explicit final step.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::collate;
use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::index::{FilterExpr, IndexClient, SchemaManager, SearchHit, SearchQuery};
use crate::model::raw::{self, fields};
use crate::model::{MetadataValue, WorkStatus, WorkSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Relevance,
    YearAsc,
    YearDesc,
    /// Title, Estonian alphabet order.
    TitleAz,
    /// Last modified first.
    Recent,
}

#[derive(Debug, Clone, Default)]
pub struct WorkFilter {
    pub query: String,
    /// Inclusive bounds, independently optional.
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
    pub author: Option<String>,
    pub respondens: Option<String>,
    pub printer: Option<String>,
    pub status: Option<WorkStatus>,
    /// Matched against the precomputed ancestry field, so filtering on a
    /// parent collection also matches works in its children.
    pub collection: Option<String>,
    pub genre: Option<String>,
    pub work_type: Option<String>,
    /// AND semantics: a work must carry every listed tag.
    pub tags: Vec<String>,
    /// Language for the language-suffixed genre/type/tag fields; falls back
    /// to the configured primary language.
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkListRequest {
    pub filter: WorkFilter,
    pub sort: SortKey,
    /// Allow any page of a work to match, instead of first pages only.
    /// Recency sorting forces this so the most recently touched page
    /// surfaces its work.
    pub any_page: bool,
    pub limit: usize,
    pub offset: usize,
}

pub struct WorksService {
    index: Arc<dyn IndexClient>,
    schema: Arc<SchemaManager>,
    language: String,
    limits: LimitsConfig,
}

impl WorksService {
    pub fn new(
        index: Arc<dyn IndexClient>,
        schema: Arc<SchemaManager>,
        language: String,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            index,
            schema,
            language,
            limits,
        }
    }

    pub async fn list_works(&self, request: &WorkListRequest) -> Result<Vec<WorkSummary>> {
        self.schema.ensure_ready().await;

        let limit = if request.limit == 0 { 20 } else { request.limit };
        let any_page = request.any_page || request.sort == SortKey::Recent;
        let filter = self.build_filter(&request.filter, !any_page);

        let hits = match request.sort {
            SortKey::Relevance => {
                let mut query = SearchQuery::new(&request.filter.query);
                query.filter = filter;
                query.limit = self.limits.relevance_scan;
                let response = self
                    .index
                    .search(&query)
                    .await
                    .map_err(|e| Error::connectivity(self.index.host(), e))?;
                let deduped = dedup_keep_first(response.hits);
                deduped
                    .into_iter()
                    .skip(request.offset)
                    .take(limit)
                    .collect()
            }
            sort => {
                let mut query = SearchQuery::new(&request.filter.query);
                query.filter = filter;
                query.distinct = Some(fields::WORK_ID.to_string());
                query.sort = sort_expression(sort);
                query.limit = limit;
                query.offset = request.offset;
                self.index
                    .search(&query)
                    .await
                    .map_err(|e| Error::connectivity(self.index.host(), e))?
                    .hits
            }
        };
        debug!(count = hits.len(), "primary work query resolved");

        let mut summaries: Vec<WorkSummary> =
            hits.iter().filter_map(summary_from_hit).collect();

        let ids: Vec<String> = summaries.iter().map(|s| s.work_id.clone()).collect();
        let representatives = self.representative_pages(&ids).await?;
        for summary in &mut summaries {
            if let Some(rep) = representatives.get(&summary.work_id) {
                summary.thumbnail_url = rep.thumbnail_url.clone();
                summary.tags = rep.tags.clone();
            }
        }

        // Relevance order was established by the index and must be left
        // untouched; everything else is re-sorted here.
        if request.sort != SortKey::Relevance {
            resort(&mut summaries, request.sort);
        }
        Ok(summaries)
    }

    fn build_filter(&self, filter: &WorkFilter, first_page_only: bool) -> Option<FilterExpr> {
        let lang = filter.language.as_deref().unwrap_or(&self.language);
        let mut parts = Vec::new();
        if first_page_only {
            parts.push(FilterExpr::EqNum(fields::PAGE_NUMBER.into(), 1));
        }
        if let Some(from) = filter.year_from {
            parts.push(FilterExpr::Ge(fields::YEAR.into(), from));
        }
        if let Some(to) = filter.year_to {
            parts.push(FilterExpr::Le(fields::YEAR.into(), to));
        }
        if let Some(author) = &filter.author {
            parts.push(FilterExpr::eq(fields::AUTHORS, author));
        }
        if let Some(respondens) = &filter.respondens {
            parts.push(FilterExpr::eq(fields::RESPONDENS, respondens));
        }
        if let Some(printer) = &filter.printer {
            parts.push(FilterExpr::eq(fields::PUBLISHER, printer));
        }
        if let Some(status) = filter.status {
            parts.push(FilterExpr::eq(fields::WORK_STATUS, status_value(status)));
        }
        if let Some(collection) = &filter.collection {
            parts.push(FilterExpr::eq(fields::COLLECTION_PATH, collection));
        }
        if let Some(genre) = &filter.genre {
            parts.push(FilterExpr::eq(fields::genre_in(lang), genre));
        }
        if let Some(work_type) = &filter.work_type {
            parts.push(FilterExpr::eq(fields::type_in(lang), work_type));
        }
        for tag in &filter.tags {
            parts.push(FilterExpr::eq(fields::tags_in(lang), tag));
        }
        FilterExpr::and(parts)
    }

    /// Resolve thumbnail and tag data from the lowest-numbered page of each
    /// work. Ids are chunked to keep filter expressions bounded; chunks are
    /// queried concurrently and joined.
    async fn representative_pages(
        &self,
        work_ids: &[String],
    ) -> Result<HashMap<String, RepresentativePage>> {
        let queries = work_ids.chunks(self.limits.batch_size).map(|chunk| {
            let alternatives: Vec<FilterExpr> = chunk
                .iter()
                .flat_map(|id| {
                    [
                        FilterExpr::eq(fields::WORK_ID, id),
                        FilterExpr::eq(fields::WORK_ID_LEGACY, id),
                    ]
                })
                .collect();
            let mut query = SearchQuery::new("");
            query.filter = Some(FilterExpr::Or(alternatives));
            query.sort = vec![format!("{}:asc", fields::PAGE_NUMBER)];
            query.limit = chunk.len() * 25;
            async move {
                self.index
                    .search(&query)
                    .await
                    .map_err(|e| Error::connectivity(self.index.host(), e))
            }
        });
        let responses = try_join_all(queries).await?;

        // Hits arrive page-number ascending per chunk, so first-seen per
        // work is its lowest page.
        let mut merged = HashMap::new();
        for response in responses {
            for hit in &response.hits {
                let Some(map) = hit.document.as_object() else {
                    continue;
                };
                let Some(work_id) = raw::read_string(map, "work_id") else {
                    continue;
                };
                merged
                    .entry(work_id)
                    .or_insert_with(|| RepresentativePage {
                        thumbnail_url: raw::read_string(map, "image_url"),
                        tags: raw::read_field(map, "tags")
                            .and_then(|v| serde_json::from_value(v.clone()).ok())
                            .map(raw::normalize_tags)
                            .unwrap_or_default(),
                    });
            }
        }
        Ok(merged)
    }
}

struct RepresentativePage {
    thumbnail_url: Option<String>,
    tags: Vec<MetadataValue>,
}

/// Filter literal for a work status; must match the serde wire names.
fn status_value(status: WorkStatus) -> &'static str {
    match status {
        WorkStatus::Raw => "raw",
        WorkStatus::InProgress => "in_progress",
        WorkStatus::Done => "done",
    }
}

fn sort_expression(sort: SortKey) -> Vec<String> {
    match sort {
        SortKey::Relevance => vec![],
        SortKey::YearAsc => vec![format!("{}:asc", fields::YEAR)],
        SortKey::YearDesc => vec![format!("{}:desc", fields::YEAR)],
        SortKey::TitleAz => vec![format!("{}:asc", fields::TITLE)],
        SortKey::Recent => vec![format!("{}:desc", fields::MODIFIED_AT)],
    }
}

/// Client-side dedup by work identifier, keeping the first occurrence so the
/// highest-ranked hit per work survives in relevance order.
pub(crate) fn dedup_keep_first(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| {
            let work_id = hit
                .document
                .as_object()
                .and_then(|map| raw::read_string(map, "work_id"));
            match work_id {
                Some(id) => seen.insert(id),
                // A document without a work identifier cannot be grouped;
                // keep it rather than lose the hit.
                None => true,
            }
        })
        .collect()
}

fn summary_from_hit(hit: &SearchHit) -> Option<WorkSummary> {
    let map = hit.document.as_object()?;
    let work_id = raw::read_string(map, "work_id")?;
    Some(WorkSummary {
        work_id,
        title: raw::read_string(map, "title").unwrap_or_default(),
        year: raw::read_i64(map, "year").map(|y| y as i32),
        creators: raw::read_creators(map),
        location: raw::read_string(map, "location"),
        publisher: raw::read_string(map, "publisher"),
        status: map
            .get(fields::WORK_STATUS)
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        tags: Vec::new(),
        thumbnail_url: None,
        page_count: raw::read_u32(map, fields::PAGE_COUNT),
        modified_at: raw::read_datetime(map, "modified_at"),
    })
}

/// Explicit client-side re-sort; the index's distinct + secondary sort
/// combination is not trustworthy. Missing values sort last.
fn resort(summaries: &mut [WorkSummary], sort: SortKey) {
    match sort {
        SortKey::Relevance => {}
        SortKey::YearAsc => {
            summaries.sort_by_key(|s| s.year.map_or((1, 0), |y| (0, y)));
        }
        SortKey::YearDesc => {
            summaries.sort_by_key(|s| s.year.map_or((1, 0), |y| (0, -y)));
        }
        SortKey::TitleAz => {
            summaries.sort_by(|a, b| collate::compare(&a.title, &b.title));
        }
        SortKey::Recent => {
            summaries.sort_by_key(|s| match s.modified_at {
                Some(t) => (0i8, -t.timestamp_millis()),
                None => (1, 0),
            });
        }
    }
}
