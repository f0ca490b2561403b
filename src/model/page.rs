use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MetadataValue;

/// Editorial state of one page. Only the 3-way rollup below is derived from
/// this; the finer distinctions exist for the editors' own tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    #[default]
    Raw,
    InProgress,
    Corrected,
    Annotated,
    Done,
}

/// Derived work-level status, recomputed from page statuses on every save.
/// Never edited directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Raw,
    InProgress,
    Done,
}

impl WorkStatus {
    /// Estonian display label, as shown on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            WorkStatus::Raw => "Toores",
            WorkStatus::InProgress => "Töös",
            WorkStatus::Done => "Valmis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    TextEdit,
    StatusChange,
}

/// One entry of the append-only edit log, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub user: String,
    pub action: HistoryAction,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl HistoryEntry {
    /// Classify and stamp a new entry. The action is inferred from the
    /// human-readable description, matching how the edit UI reports saves.
    pub fn record(user: &str, description: &str) -> Self {
        let lower = description.to_lowercase();
        let action = if lower.contains("status") || lower.contains("staatus") {
            HistoryAction::StatusChange
        } else {
            HistoryAction::TextEdit
        };
        Self {
            id: Uuid::new_v4().to_string(),
            user: user.to_string(),
            action,
            timestamp: Utc::now(),
            description: description.to_string(),
        }
    }
}

/// One scanned leaf with its transcription and editorial apparatus.
/// Belongs to exactly one work; addressed by (work id, page number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Index document id.
    pub id: String,
    /// Work identifier; accepts both the legacy slug and the newer short id.
    pub work_id: String,
    /// 1-based, unique within a work (by ingestion, not enforced here).
    pub page_number: u32,
    pub text: String,
    pub status: PageStatus,
    #[serde(default)]
    pub tags: Vec<MetadataValue>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Denormalized rollup over all sibling pages.
    pub work_status: Option<WorkStatus>,
    pub image_url: Option<String>,
    /// Path of the source file in the original catalog; together with
    /// `image_url` this locates the file-server backup target.
    pub source_path: Option<String>,
    pub catalog: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}
