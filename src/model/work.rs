use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LinkedEntity, MetadataValue, WorkStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatorRole {
    Praeses,
    Respondens,
    Author,
    Printer,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    pub role: CreatorRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<LinkedEntity>,
}

/// One dashboard row: a work plus the representative-page data (thumbnail,
/// tags) resolved in the second query phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSummary {
    pub work_id: String,
    pub title: String,
    pub year: Option<i32>,
    #[serde(default)]
    pub creators: Vec<Creator>,
    pub location: Option<String>,
    pub publisher: Option<String>,
    pub status: Option<WorkStatus>,
    #[serde(default)]
    pub tags: Vec<MetadataValue>,
    pub thumbnail_url: Option<String>,
    pub page_count: Option<u32>,
    pub modified_at: Option<DateTime<Utc>>,
}
