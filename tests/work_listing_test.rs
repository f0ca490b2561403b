//! Dashboard work-listing flows through a scripted index.

mod common;

use std::sync::Arc;

use common::{page_doc, MockIndex};
use scriptorium::config::Config;
use scriptorium::error::Error;
use scriptorium::index::{SearchHit, SearchResponse};
use scriptorium::service::{SortKey, WorkFilter, WorkListRequest};
use scriptorium::Workspace;

fn hits(docs: Vec<serde_json::Value>) -> SearchResponse {
    SearchResponse {
        estimated_total_hits: docs.len() as u64,
        hits: docs
            .into_iter()
            .map(|document| SearchHit {
                document,
                formatted: None,
            })
            .collect(),
        facet_distribution: Default::default(),
    }
}

fn workspace(mock: &Arc<MockIndex>) -> Workspace {
    Workspace::with_index(mock.clone(), None, &Config::default())
}

#[tokio::test]
async fn relevance_sort_dedups_client_side_keeping_rank_order() {
    common::init_logging();
    let mock = Arc::new(MockIndex::new());
    // Ranked hits: work A at 0, 2; work B at 1. Primary query response.
    mock.queue(hits(vec![
        page_doc("A", 4, "done"),
        page_doc("B", 1, "raw"),
        page_doc("A", 1, "done"),
    ]));
    // Representative-page batch response.
    mock.queue(hits(vec![
        page_doc("A", 1, "done"),
        page_doc("B", 1, "raw"),
    ]));

    let request = WorkListRequest {
        filter: WorkFilter {
            query: "disputatio".into(),
            ..Default::default()
        },
        sort: SortKey::Relevance,
        limit: 20,
        ..Default::default()
    };
    let works = workspace(&mock).works.list_works(&request).await.unwrap();

    let ids: Vec<&str> = works.iter().map(|w| w.work_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);

    // Relevance never uses server-side distinct.
    let primary = mock.nth_search(0);
    assert!(primary.distinct.is_none());
    assert!(primary.sort.is_empty());
    assert_eq!(primary.q, "disputatio");
}

#[tokio::test]
async fn non_relevance_sorts_use_distinct_and_client_resort() {
    let mock = Arc::new(MockIndex::new());
    // Index returns distinct hits in an order we deliberately scramble.
    let mut first = page_doc("A", 1, "raw");
    first["year"] = serde_json::json!(1650);
    let mut second = page_doc("B", 1, "raw");
    second["year"] = serde_json::json!(1699);
    let mut third = page_doc("C", 1, "raw");
    third["year"] = serde_json::json!(1630);
    mock.queue(hits(vec![first, second, third]));
    mock.queue(hits(vec![]));

    let request = WorkListRequest {
        sort: SortKey::YearDesc,
        limit: 20,
        ..Default::default()
    };
    let works = workspace(&mock).works.list_works(&request).await.unwrap();

    let years: Vec<i32> = works.iter().filter_map(|w| w.year).collect();
    assert_eq!(years, vec![1699, 1650, 1630]);

    let primary = mock.nth_search(0);
    assert_eq!(primary.distinct.as_deref(), Some("work_id"));
    assert_eq!(primary.sort, vec!["year:desc".to_string()]);
    // Dashboard default restricts the primary query to first pages.
    assert!(primary.filter.as_ref().unwrap().render().contains("page_number = 1"));
}

#[tokio::test]
async fn recent_sort_allows_any_page_to_represent_its_work() {
    let mock = Arc::new(MockIndex::new());
    mock.queue(hits(vec![]));

    let request = WorkListRequest {
        sort: SortKey::Recent,
        limit: 20,
        ..Default::default()
    };
    workspace(&mock).works.list_works(&request).await.unwrap();

    let primary = mock.nth_search(0);
    assert_eq!(primary.sort, vec!["modified_at:desc".to_string()]);
    let filter = primary.filter.map(|f| f.render()).unwrap_or_default();
    assert!(!filter.contains("page_number = 1"));
}

#[tokio::test]
async fn filters_compose_into_one_expression() {
    let mock = Arc::new(MockIndex::new());
    mock.queue(hits(vec![]));

    let request = WorkListRequest {
        filter: WorkFilter {
            year_from: Some(1630),
            year_to: Some(1710),
            collection: Some("Academia Gustaviana".into()),
            tags: vec!["juubel".into(), "ladina".into()],
            ..Default::default()
        },
        sort: SortKey::TitleAz,
        limit: 20,
        ..Default::default()
    };
    workspace(&mock).works.list_works(&request).await.unwrap();

    let rendered = mock.nth_search(0).filter.unwrap().render();
    assert!(rendered.contains("year >= 1630"));
    assert!(rendered.contains("year <= 1710"));
    assert!(rendered.contains("collection_path = \"Academia Gustaviana\""));
    // Tag filters AND together against the primary-language field.
    assert!(rendered.contains("tags_et = \"juubel\""));
    assert!(rendered.contains("tags_et = \"ladina\""));
}

#[tokio::test]
async fn index_failures_surface_as_connectivity_errors_naming_the_host() {
    let mock = Arc::new(MockIndex::new());
    mock.queue_error(Error::Index("500: internal".into()));

    let request = WorkListRequest {
        sort: SortKey::Relevance,
        limit: 20,
        ..Default::default()
    };
    let err = workspace(&mock)
        .works
        .list_works(&request)
        .await
        .unwrap_err();
    match err {
        Error::Connectivity { host, .. } => assert_eq!(host, "http://mock-index:7700"),
        other => panic!("expected connectivity error, got {other}"),
    }
}

#[tokio::test]
async fn representative_lookup_attaches_thumbnail_and_tags() {
    let mock = Arc::new(MockIndex::new());
    mock.queue(hits(vec![page_doc("A", 1, "raw")]));
    let mut rep = page_doc("A", 1, "raw");
    rep["image_url"] = serde_json::json!("https://img.example.org/A/1.jpg");
    rep["tags"] = serde_json::json!(["Ladina", "ladina", "Juubel"]);
    mock.queue(hits(vec![rep]));

    let request = WorkListRequest {
        sort: SortKey::TitleAz,
        limit: 20,
        ..Default::default()
    };
    let works = workspace(&mock).works.list_works(&request).await.unwrap();

    assert_eq!(works.len(), 1);
    assert_eq!(
        works[0].thumbnail_url.as_deref(),
        Some("https://img.example.org/A/1.jpg")
    );
    // Plain tags arrive normalized: lower-cased, case-insensitively deduped.
    assert_eq!(works[0].tags.len(), 2);

    // The batch query asks for pages in ascending page order.
    let rep_query = mock.nth_search(1);
    assert_eq!(rep_query.sort, vec!["page_number:asc".to_string()]);
}
