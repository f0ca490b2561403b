//! Full-text search across transcriptions, tags and annotations.
//!
//! Cross-work searches answer two questions at once: which works match
//! (one representative hit each, relevance ranked) and how often each work
//! matches. Distinct-by-work suppresses true counts, so two queries run
//! concurrently: a zero-limit faceted query for the counts and a distinct
//! paginated query for the representatives, merged afterwards. A search
//! scoped to one work needs no grouping and pages over raw hits instead.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::index::{
    is_schema_convergence_message, CropConfig, FilterExpr, IndexClient, SchemaManager, SearchHit,
    SearchQuery, SearchResponse,
};
use crate::model::raw::{self, fields};

/// Which page fields are searched and highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Transcription text, tags and comment text.
    #[default]
    All,
    /// Transcription text only.
    Original,
    /// Tags and comment text only.
    Annotation,
}

impl SearchScope {
    fn attributes(&self) -> Vec<String> {
        let attrs: &[&str] = match self {
            SearchScope::All => &[fields::TEXT, fields::TAGS_FLAT, fields::COMMENT_TEXT],
            SearchScope::Original => &[fields::TEXT],
            SearchScope::Annotation => &[fields::TAGS_FLAT, fields::COMMENT_TEXT],
        };
        attrs.iter().map(|s| s.to_string()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentQuery {
    pub query: String,
    pub scope: SearchScope,
    /// Inclusive year bounds.
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
    /// Exact catalog/collection name.
    pub catalog: Option<String>,
    /// When set, switches to single-work mode: all matching pages of this
    /// work, paginated by hit instead of by work.
    pub work_id: Option<String>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

/// One result row: the representative page of a work (cross-work mode) or
/// one matching page (single-work mode).
#[derive(Debug, Clone)]
pub struct ContentHit {
    pub work_id: String,
    pub page_id: String,
    pub page_number: u32,
    pub title: Option<String>,
    pub catalog: Option<String>,
    /// Cropped text with highlight markers around matched spans.
    pub snippet: Option<String>,
    /// True number of matching pages in this work (1 in single-work mode,
    /// where every hit is already a page).
    pub hit_count: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ContentResults {
    pub hits: Vec<ContentHit>,
    /// Total matching pages across all works.
    pub total_hits: u64,
    /// Total distinct matching works.
    pub total_works: u64,
    /// Result pages at the requested page size.
    pub total_pages: u64,
    /// Per-field value counts (catalog, work id), for labeling result groups.
    pub facets: HashMap<String, HashMap<String, u64>>,
}

pub struct ContentService {
    index: Arc<dyn IndexClient>,
    schema: Arc<SchemaManager>,
}

impl ContentService {
    pub fn new(index: Arc<dyn IndexClient>, schema: Arc<SchemaManager>) -> Self {
        Self { index, schema }
    }

    pub async fn search(&self, request: &ContentQuery) -> Result<ContentResults> {
        self.schema.ensure_ready().await;
        match &request.work_id {
            Some(work_id) => self.search_single_work(request, work_id).await,
            None => self.search_across_works(request).await,
        }
    }

    async fn search_single_work(
        &self,
        request: &ContentQuery,
        work_id: &str,
    ) -> Result<ContentResults> {
        let page_size = page_size_of(request);
        let mut query = self.base_query(request);
        let mut parts = vec![FilterExpr::Or(vec![
            FilterExpr::eq(fields::WORK_ID, work_id),
            FilterExpr::eq(fields::WORK_ID_LEGACY, work_id),
        ])];
        parts.extend(range_and_catalog(request));
        query.filter = FilterExpr::and(parts);
        query.limit = page_size;
        query.offset = offset_of(request);
        query.facets = vec![fields::CATALOG.to_string(), fields::WORK_ID.to_string()];

        let response = self.run(&query).await?;
        let total_hits = response.estimated_total_hits;
        Ok(ContentResults {
            hits: response
                .hits
                .iter()
                .filter_map(|hit| content_hit(hit, 1))
                .collect(),
            total_hits,
            total_works: 1,
            total_pages: total_hits.div_ceil(page_size as u64),
            facets: response.facet_distribution,
        })
    }

    async fn search_across_works(&self, request: &ContentQuery) -> Result<ContentResults> {
        let page_size = page_size_of(request);
        let filter = FilterExpr::and(range_and_catalog(request));

        // Facet-only query: its sole purpose is true per-work hit counts,
        // which the distinct query cannot report.
        let mut facet_query = self.base_query(request);
        facet_query.filter = filter.clone();
        facet_query.limit = 0;
        facet_query.facets = vec![fields::WORK_ID.to_string(), fields::CATALOG.to_string()];

        let mut distinct_query = self.base_query(request);
        distinct_query.filter = filter;
        distinct_query.distinct = Some(fields::WORK_ID.to_string());
        distinct_query.limit = page_size;
        distinct_query.offset = offset_of(request);

        let (facet_response, distinct_response) =
            tokio::try_join!(self.run(&facet_query), self.run(&distinct_query))?;

        let hits = distinct_response
            .hits
            .iter()
            .filter_map(|hit| {
                let work_id = work_id_of(hit)?;
                let count = facet_response
                    .facet_count(fields::WORK_ID, &work_id)
                    .unwrap_or(1);
                content_hit(hit, count)
            })
            .collect();

        let total_works = distinct_response.estimated_total_hits;
        Ok(ContentResults {
            hits,
            total_hits: facet_response.estimated_total_hits,
            total_works,
            total_pages: total_works.div_ceil(page_size as u64),
            facets: facet_response.facet_distribution,
        })
    }

    fn base_query(&self, request: &ContentQuery) -> SearchQuery {
        let attributes = request.scope.attributes();
        let mut query = SearchQuery::new(&request.query);
        query.attributes_to_search_on = Some(attributes.clone());
        query.crop = Some(CropConfig {
            attributes,
            ..CropConfig::default()
        });
        query
    }

    /// Run one query, translating schema-convergence rejections into the
    /// retryable warming condition. The index may still be applying the
    /// settings update from [`SchemaManager`]; that state is transient and
    /// self-resolving.
    async fn run(&self, query: &SearchQuery) -> Result<SearchResponse> {
        match self.index.search(query).await {
            Ok(response) => Ok(response),
            Err(Error::Index(message)) if is_schema_convergence_message(&message) => {
                Err(Error::IndexWarming(message))
            }
            Err(err) => Err(Error::connectivity(self.index.host(), err)),
        }
    }
}

fn page_size_of(request: &ContentQuery) -> usize {
    if request.page_size == 0 {
        10
    } else {
        request.page_size
    }
}

fn offset_of(request: &ContentQuery) -> usize {
    page_size_of(request) * request.page.saturating_sub(1)
}

fn range_and_catalog(request: &ContentQuery) -> Vec<FilterExpr> {
    let mut parts = Vec::new();
    if let Some(from) = request.year_from {
        parts.push(FilterExpr::Ge(fields::YEAR.into(), from));
    }
    if let Some(to) = request.year_to {
        parts.push(FilterExpr::Le(fields::YEAR.into(), to));
    }
    if let Some(catalog) = &request.catalog {
        parts.push(FilterExpr::eq(fields::CATALOG, catalog));
    }
    parts
}

fn work_id_of(hit: &SearchHit) -> Option<String> {
    hit.document
        .as_object()
        .and_then(|map| raw::read_string(map, "work_id"))
}

fn content_hit(hit: &SearchHit, hit_count: u64) -> Option<ContentHit> {
    let map = hit.document.as_object()?;
    let snippet = [fields::TEXT, fields::COMMENT_TEXT, fields::TAGS_FLAT]
        .iter()
        .find_map(|f| hit.formatted_field(f))
        .map(str::to_string);
    Some(ContentHit {
        work_id: raw::read_string(map, "work_id")?,
        page_id: raw::read_string(map, fields::ID)?,
        page_number: raw::read_u32(map, "page_number").unwrap_or(0),
        title: raw::read_string(map, "title"),
        catalog: raw::read_string(map, "catalog"),
        snippet,
        hit_count,
    })
}
