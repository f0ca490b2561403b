//! Reqwest implementation of [`IndexClient`] for a Meilisearch-style HTTP
//! API: POST search, GET/PATCH settings, PUT documents, and task polling
//! until writes are durably applied.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::{is_schema_convergence_message, IndexClient, IndexSettings, SearchQuery, SearchResponse};
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::index::query::SearchHit;

const TASK_POLL_INTERVAL: Duration = Duration::from_millis(200);
const TASK_POLL_ATTEMPTS: usize = 150;

pub struct RemoteIndex {
    client: reqwest::Client,
    host: String,
    index_uid: String,
    api_key: Option<String>,
    /// Scheme of the origin the UI is served from, when known.
    origin_scheme: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequestBody<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    sort: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    distinct: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    facets: &'a [String],
    limit: usize,
    offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes_to_search_on: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes_to_crop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crop_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes_to_highlight: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    highlight_pre_tag: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    highlight_post_tag: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearchResponse {
    hits: Vec<Value>,
    #[serde(default)]
    estimated_total_hits: Option<u64>,
    #[serde(default)]
    facet_distribution: Option<HashMap<String, HashMap<String, u64>>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnqueuedTask {
    task_uid: u64,
}

#[derive(Deserialize)]
struct TaskStatus {
    status: String,
    #[serde(default)]
    error: Option<TaskError>,
}

#[derive(Deserialize)]
struct TaskError {
    message: String,
}

impl RemoteIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let origin_scheme = config
            .app_origin
            .as_deref()
            .and_then(|o| o.split("://").next())
            .map(str::to_string);
        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            index_uid: config.index_uid.clone(),
            api_key: config.api_key.clone(),
            origin_scheme,
        })
    }

    /// Refuse to mix a secure page origin with a plain-http index endpoint.
    /// Runs before any network I/O on every call.
    fn preflight(&self) -> Result<()> {
        if let Some(scheme) = self.origin_scheme.as_deref() {
            if scheme.eq_ignore_ascii_case("https") && self.host.starts_with("http://") {
                return Err(Error::MixedContent {
                    origin_scheme: scheme.to_string(),
                    host: self.host.clone(),
                });
            }
        }
        Ok(())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, format!("{}{path}", self.host));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        Error::Connectivity {
            host: self.host.clone(),
            source: Box::new(err),
        }
    }

    /// Map a non-success response body to a typed error: schema-convergence
    /// rejections become a retry signal, everything else stays opaque.
    async fn response_error(&self, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if is_schema_convergence_message(&body) {
            Error::IndexWarming(body)
        } else {
            Error::Index(format!("{status}: {body}"))
        }
    }

    async fn wait_for_task(&self, task_uid: u64) -> Result<()> {
        for _ in 0..TASK_POLL_ATTEMPTS {
            let response = self
                .request(reqwest::Method::GET, &format!("/tasks/{task_uid}"))
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;
            if !response.status().is_success() {
                return Err(self.response_error(response).await);
            }
            let task: TaskStatus = response.json().await.map_err(|e| self.transport_error(e))?;
            match task.status.as_str() {
                "succeeded" => return Ok(()),
                "failed" | "canceled" => {
                    let message = task
                        .error
                        .map(|e| e.message)
                        .unwrap_or_else(|| task.status.clone());
                    if is_schema_convergence_message(&message) {
                        return Err(Error::IndexWarming(message));
                    }
                    return Err(Error::Index(format!("task {task_uid} {message}")));
                }
                _ => tokio::time::sleep(TASK_POLL_INTERVAL).await,
            }
        }
        Err(Error::Index(format!(
            "task {task_uid} did not complete in time"
        )))
    }
}

#[async_trait]
impl IndexClient for RemoteIndex {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        self.preflight()?;
        let crop = query.crop.as_ref();
        let body = SearchRequestBody {
            q: &query.q,
            filter: query.filter.as_ref().map(|f| f.render()),
            sort: &query.sort,
            distinct: query.distinct.as_deref(),
            facets: &query.facets,
            limit: query.limit,
            offset: query.offset,
            attributes_to_search_on: query.attributes_to_search_on.as_deref(),
            attributes_to_crop: crop.map(|c| c.attributes.as_slice()),
            crop_length: crop.map(|c| c.crop_length),
            attributes_to_highlight: crop.map(|c| c.attributes.as_slice()),
            highlight_pre_tag: crop.map(|c| c.pre_tag.as_str()),
            highlight_post_tag: crop.map(|c| c.post_tag.as_str()),
        };

        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/indexes/{}/search", self.index_uid),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !response.status().is_success() {
            return Err(self.response_error(response).await);
        }
        let raw: RawSearchResponse = response.json().await.map_err(|e| self.transport_error(e))?;

        let hits = raw
            .hits
            .into_iter()
            .map(|mut hit| {
                let formatted = hit
                    .as_object_mut()
                    .and_then(|obj| obj.remove("_formatted"));
                SearchHit {
                    document: hit,
                    formatted,
                }
            })
            .collect();
        Ok(SearchResponse {
            hits,
            estimated_total_hits: raw.estimated_total_hits.unwrap_or(0),
            facet_distribution: raw.facet_distribution.unwrap_or_default(),
        })
    }

    async fn settings(&self) -> Result<IndexSettings> {
        self.preflight()?;
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/indexes/{}/settings", self.index_uid),
            )
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !response.status().is_success() {
            return Err(self.response_error(response).await);
        }
        response.json().await.map_err(|e| self.transport_error(e))
    }

    async fn apply_settings(&self, settings: &IndexSettings) -> Result<()> {
        self.preflight()?;
        let response = self
            .request(
                reqwest::Method::PATCH,
                &format!("/indexes/{}/settings", self.index_uid),
            )
            .json(settings)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !response.status().is_success() {
            return Err(self.response_error(response).await);
        }
        let task: EnqueuedTask = response.json().await.map_err(|e| self.transport_error(e))?;
        self.wait_for_task(task.task_uid).await
    }

    async fn update_documents(&self, docs: &[Value]) -> Result<()> {
        self.preflight()?;
        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/indexes/{}/documents", self.index_uid),
            )
            .json(docs)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !response.status().is_success() {
            return Err(self.response_error(response).await);
        }
        let task: EnqueuedTask = response.json().await.map_err(|e| self.transport_error(e))?;
        self.wait_for_task(task.task_uid).await
    }

    fn host(&self) -> &str {
        &self.host
    }
}
