//! Shared test fixture: a scripted in-memory index client.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use scriptorium::error::{Error, Result};
use scriptorium::index::{IndexClient, IndexSettings, SearchQuery, SearchResponse};

/// Route service logs through the test harness; safe to call repeatedly.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct MockIndex {
    /// Responses handed out in order; an exhausted queue yields empty
    /// result sets so incidental queries do not panic.
    responses: Mutex<VecDeque<Result<SearchResponse>>>,
    pub searches: Mutex<Vec<SearchQuery>>,
    pub updates: Mutex<Vec<Vec<Value>>>,
    pub settings_calls: AtomicUsize,
    pub settings_updates: AtomicUsize,
    settings: Mutex<IndexSettings>,
}

impl MockIndex {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            searches: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            settings_calls: AtomicUsize::new(0),
            settings_updates: AtomicUsize::new(0),
            settings: Mutex::new(converged_settings()),
        }
    }

    pub fn with_settings(settings: IndexSettings) -> Self {
        let mock = Self::new();
        *mock.settings.lock().unwrap() = settings;
        mock
    }

    pub fn queue(&self, response: SearchResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_error(&self, error: Error) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    pub fn nth_search(&self, n: usize) -> SearchQuery {
        self.searches.lock().unwrap()[n].clone()
    }
}

/// Settings that already satisfy the schema manager, so tests exercise the
/// no-write path unless they say otherwise.
pub fn converged_settings() -> IndexSettings {
    IndexSettings {
        searchable_attributes: vec!["*".into()],
        sortable_attributes: ["year", "title", "modified_at", "page_number"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        filterable_attributes: [
            "work_id",
            "teose_id",
            "page_number",
            "year",
            "status",
            "work_status",
            "authors",
            "respondens",
            "publisher",
            "collection_path",
            "catalog",
            "tags_et",
            "tags_en",
            "genre_et",
            "genre_en",
            "type_et",
            "type_en",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        ranking_rules: ["exactness", "words", "typo", "proximity", "attribute", "sort"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        distinct_attribute: None,
        faceting: None,
        pagination: None,
    }
}

#[async_trait]
impl IndexClient for MockIndex {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        self.searches.lock().unwrap().push(query.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SearchResponse::default()))
    }

    async fn settings(&self) -> Result<IndexSettings> {
        self.settings_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn apply_settings(&self, settings: &IndexSettings) -> Result<()> {
        self.settings_updates.fetch_add(1, Ordering::SeqCst);
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }

    async fn update_documents(&self, docs: &[Value]) -> Result<()> {
        self.updates.lock().unwrap().push(docs.to_vec());
        Ok(())
    }

    fn host(&self) -> &str {
        "http://mock-index:7700"
    }
}

/// A page document in the current schema.
pub fn page_doc(work_id: &str, page_number: u32, status: &str) -> Value {
    serde_json::json!({
        "id": format!("{work_id}-{page_number}"),
        "work_id": work_id,
        "page_number": page_number,
        "status": status,
        "title": format!("Disputatio {work_id}"),
        "text": "Quod felix faustumque sit",
    })
}
