//! HTTP client for the file server that keeps durable text and version
//! backups alongside the index, plus authentication and the authoritative
//! bibliographic metadata sidecars.
//!
//! Protocol quirks are the server's, not ours: every endpoint is POST with a
//! JSON body, authenticated calls carry the session token *in the body*, and
//! responses use a uniform `{status, message?}` envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::FileServerConfig;
use crate::error::{Error, Result};
use crate::model::{Comment, HistoryEntry, MetadataValue, Page, PageStatus};

pub struct FileServerClient {
    client: reqwest::Client,
    base: String,
    save_timeout: Duration,
    timeout: Duration,
}

/// JSON sidecar persisted next to the plain-text content on every backup,
/// so a restore can bring back the editorial apparatus too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSidecar {
    pub status: PageStatus,
    pub tags: Vec<MetadataValue>,
    pub comments: Vec<Comment>,
    pub history: Vec<HistoryEntry>,
}

impl From<&Page> for PageSidecar {
    fn from(page: &Page) -> Self {
        Self {
            status: page.status,
            tags: page.tags.clone(),
            comments: page.comments.clone(),
            history: page.history.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataSuggestions {
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub places: Vec<String>,
    #[serde(default)]
    pub printers: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackupVersion {
    pub revision: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    rest: Value,
}

impl FileServerClient {
    pub fn new(config: &FileServerConfig) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base: config.url.trim_end_matches('/').to_string(),
            save_timeout: Duration::from_secs(config.save_timeout_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    async fn post(&self, endpoint: &str, body: &Value, timeout: Duration) -> Result<Envelope> {
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.base))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Connectivity {
                host: self.base.clone(),
                source: Box::new(e),
            })?;
        let envelope: Envelope = response.json().await.map_err(|e| Error::Connectivity {
            host: self.base.clone(),
            source: Box::new(e),
        })?;
        if envelope.status != "success" {
            return Err(Error::FileServer(
                envelope
                    .message
                    .unwrap_or_else(|| format!("{endpoint} failed")),
            ));
        }
        Ok(envelope)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let envelope = self
            .post(
                "login",
                &serde_json::json!({ "username": username, "password": password }),
                self.timeout,
            )
            .await?;
        serde_json::from_value(envelope.rest).map_err(Into::into)
    }

    /// Persist page text and its JSON sidecar. The index remains the system
    /// of record; this write is the durability and version backup.
    pub async fn save(
        &self,
        token: &str,
        path: &str,
        filename: &str,
        text: &str,
        sidecar: &PageSidecar,
    ) -> Result<()> {
        self.post(
            "save",
            &serde_json::json!({
                "token": token,
                "path": path,
                "filename": filename,
                "content": text,
                "metadata": sidecar,
            }),
            self.save_timeout,
        )
        .await?;
        Ok(())
    }

    pub async fn list_backups(&self, token: &str, filename: &str) -> Result<Vec<BackupVersion>> {
        let envelope = self
            .post(
                "list-backups",
                &serde_json::json!({ "token": token, "filename": filename }),
                self.timeout,
            )
            .await?;
        let versions = envelope
            .rest
            .get("versions")
            .cloned()
            .unwrap_or(Value::Array(vec![]));
        serde_json::from_value(versions).map_err(Into::into)
    }

    /// Roll back to a prior text version; returns the restored content.
    pub async fn restore(&self, token: &str, filename: &str, revision: &str) -> Result<String> {
        let envelope = self
            .post(
                "restore",
                &serde_json::json!({ "token": token, "filename": filename, "revision": revision }),
                self.timeout,
            )
            .await?;
        envelope
            .rest
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::FileServer("restore returned no content".into()))
    }

    /// Candidate values for the metadata autocomplete pickers.
    pub async fn metadata_suggestions(&self, token: &str) -> Result<MetadataSuggestions> {
        let envelope = self
            .post(
                "get-metadata-suggestions",
                &serde_json::json!({ "token": token }),
                self.timeout,
            )
            .await?;
        serde_json::from_value(envelope.rest).map_err(Into::into)
    }

    /// Authoritative bibliographic sidecar for one work, independent of the
    /// index copy.
    pub async fn work_metadata(&self, token: &str, work_id: &str) -> Result<Value> {
        let envelope = self
            .post(
                "get-work-metadata",
                &serde_json::json!({ "token": token, "work_id": work_id }),
                self.timeout,
            )
            .await?;
        Ok(envelope
            .rest
            .get("metadata")
            .cloned()
            .unwrap_or(Value::Null))
    }

    pub async fn update_work_metadata(
        &self,
        token: &str,
        work_id: &str,
        metadata: &Value,
    ) -> Result<()> {
        self.post(
            "update-work-metadata",
            &serde_json::json!({ "token": token, "work_id": work_id, "metadata": metadata }),
            self.timeout,
        )
        .await?;
        Ok(())
    }
}
