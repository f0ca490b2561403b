//! Full-text search orchestration: facet/distinct reconciliation, scoping,
//! single-work pagination and warming translation.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{page_doc, MockIndex};
use scriptorium::config::Config;
use scriptorium::error::Error;
use scriptorium::index::{SearchHit, SearchResponse};
use scriptorium::service::{ContentQuery, SearchScope};
use scriptorium::Workspace;

fn workspace(mock: &Arc<MockIndex>) -> Workspace {
    Workspace::with_index(mock.clone(), None, &Config::default())
}

fn facet_response(work_counts: &[(&str, u64)], total: u64) -> SearchResponse {
    let mut distribution = HashMap::new();
    distribution.insert(
        "work_id".to_string(),
        work_counts
            .iter()
            .map(|(id, count)| (id.to_string(), *count))
            .collect(),
    );
    SearchResponse {
        hits: vec![],
        estimated_total_hits: total,
        facet_distribution: distribution,
    }
}

fn distinct_response(work_ids: &[&str]) -> SearchResponse {
    SearchResponse {
        estimated_total_hits: work_ids.len() as u64,
        hits: work_ids
            .iter()
            .map(|id| SearchHit {
                document: page_doc(id, 1, "raw"),
                formatted: Some(serde_json::json!({"text": "…<em>lux</em>…"})),
            })
            .collect(),
        facet_distribution: Default::default(),
    }
}

#[tokio::test]
async fn cross_work_counts_come_from_the_facet_query() {
    let mock = Arc::new(MockIndex::new());
    // Facet query answers first, then the distinct query.
    mock.queue(facet_response(&[("workA", 5), ("workB", 2)], 7));
    mock.queue(distinct_response(&["workA", "workB"]));

    let request = ContentQuery {
        query: "lux".into(),
        page: 1,
        page_size: 10,
        ..Default::default()
    };
    let results = workspace(&mock).content.search(&request).await.unwrap();

    assert_eq!(results.hits.len(), 2);
    assert_eq!(results.hits[0].work_id, "workA");
    assert_eq!(results.hits[0].hit_count, 5);
    assert_eq!(results.hits[1].hit_count, 2);
    // Totals: hits from the facet query, works from the distinct query.
    assert_eq!(results.total_hits, 7);
    assert_eq!(results.total_works, 2);
    assert_eq!(results.total_pages, 1);

    let facet_query = mock.nth_search(0);
    assert_eq!(facet_query.limit, 0);
    assert!(facet_query.facets.contains(&"work_id".to_string()));
    assert!(facet_query.distinct.is_none());

    let distinct_query = mock.nth_search(1);
    assert_eq!(distinct_query.distinct.as_deref(), Some("work_id"));
    assert_eq!(distinct_query.limit, 10);
}

#[tokio::test]
async fn representative_without_facet_entry_defaults_to_one() {
    let mock = Arc::new(MockIndex::new());
    mock.queue(facet_response(&[("workA", 5)], 6));
    mock.queue(distinct_response(&["workA", "workC"]));

    let request = ContentQuery {
        query: "lux".into(),
        page: 1,
        page_size: 10,
        ..Default::default()
    };
    let results = workspace(&mock).content.search(&request).await.unwrap();
    assert_eq!(results.hits[1].work_id, "workC");
    assert_eq!(results.hits[1].hit_count, 1);
}

#[tokio::test]
async fn scope_restricts_searched_attributes() {
    let mock = Arc::new(MockIndex::new());
    mock.queue(facet_response(&[], 0));
    mock.queue(distinct_response(&[]));

    let request = ContentQuery {
        query: "nota".into(),
        scope: SearchScope::Annotation,
        page: 1,
        page_size: 10,
        ..Default::default()
    };
    workspace(&mock).content.search(&request).await.unwrap();

    let attrs = mock.nth_search(0).attributes_to_search_on.unwrap();
    assert_eq!(attrs, vec!["tags_flat", "comment_text"]);
    // Highlighting covers the same fields as the search scope.
    let crop = mock.nth_search(1).crop.unwrap();
    assert_eq!(crop.attributes, vec!["tags_flat", "comment_text"]);
}

#[tokio::test]
async fn single_work_mode_pages_over_raw_hits() {
    let mock = Arc::new(MockIndex::new());
    let mut response = distinct_response(&["workA"]);
    response.estimated_total_hits = 23;
    mock.queue(response);

    let request = ContentQuery {
        query: "lux".into(),
        work_id: Some("workA".into()),
        page: 2,
        page_size: 10,
        ..Default::default()
    };
    let results = workspace(&mock).content.search(&request).await.unwrap();

    // One query only; no distinct needed inside a single work.
    assert_eq!(mock.search_count(), 1);
    let query = mock.nth_search(0);
    assert!(query.distinct.is_none());
    assert_eq!(query.offset, 10);
    let filter = query.filter.unwrap().render();
    assert!(filter.contains("work_id = \"workA\""));
    assert!(filter.contains("teose_id = \"workA\""));

    assert_eq!(results.total_hits, 23);
    assert_eq!(results.total_pages, 3);
    assert_eq!(results.hits[0].hit_count, 1);
    assert_eq!(results.hits[0].snippet.as_deref(), Some("…<em>lux</em>…"));
}

#[tokio::test]
async fn unsearchable_attribute_rejection_becomes_warming_signal() {
    let mock = Arc::new(MockIndex::new());
    mock.queue_error(Error::Index(
        "400: Attribute `comment_text` is not searchable.".into(),
    ));
    mock.queue(distinct_response(&[]));

    let request = ContentQuery {
        query: "lux".into(),
        page: 1,
        page_size: 10,
        ..Default::default()
    };
    let err = workspace(&mock).content.search(&request).await.unwrap_err();
    assert!(matches!(err, Error::IndexWarming(_)));
}
