use async_trait::async_trait;
use serde_json::Value;

use super::{IndexSettings, SearchQuery, SearchResponse};
use crate::error::Result;

/// Seam between the services and the search index. The production
/// implementation is [`super::RemoteIndex`]; tests drive the services
/// through in-memory fakes.
#[async_trait]
pub trait IndexClient: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse>;

    async fn settings(&self) -> Result<IndexSettings>;

    /// Apply a settings update and wait until it is durably applied.
    async fn apply_settings(&self, settings: &IndexSettings) -> Result<()>;

    /// Partial multi-document update (documents merged by id), awaiting
    /// task completion.
    async fn update_documents(&self, docs: &[Value]) -> Result<()>;

    /// Configured index host, for connectivity error messages.
    fn host(&self) -> &str;
}
