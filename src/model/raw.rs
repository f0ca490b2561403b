//! Adapter between index documents and domain types.
//!
//! Two document generations coexist in the index: a flat legacy schema with
//! Estonian field names and the current structured schema with English
//! names. This module is the only place both vocabularies appear: documents
//! are normalized on read (current name wins, legacy fills the gaps) and
//! denormalized on write (current names only). The mapping table below is
//! the single source of truth for which legacy field backs which canonical
//! field.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::{Comment, Creator, CreatorRole, HistoryEntry, MetadataValue, Page, PageStatus, WorkStatus};
use crate::error::{Error, Result};

/// Canonical index field names used by filters, sorts and facets.
pub mod fields {
    pub const ID: &str = "id";
    pub const WORK_ID: &str = "work_id";
    pub const WORK_ID_LEGACY: &str = "teose_id";
    pub const PAGE_NUMBER: &str = "page_number";
    pub const TITLE: &str = "title";
    pub const TEXT: &str = "text";
    pub const YEAR: &str = "year";
    pub const STATUS: &str = "status";
    pub const WORK_STATUS: &str = "work_status";
    pub const AUTHORS: &str = "authors";
    pub const RESPONDENS: &str = "respondens";
    pub const PUBLISHER: &str = "publisher";
    pub const COLLECTION_PATH: &str = "collection_path";
    pub const CATALOG: &str = "catalog";
    pub const MODIFIED_AT: &str = "modified_at";
    /// Flattened tag labels, searchable; language-suffixed variants
    /// (`tags_et`, `tags_en`) are filterable.
    pub const TAGS_FLAT: &str = "tags_flat";
    pub const COMMENT_TEXT: &str = "comment_text";
    pub const IMAGE_URL: &str = "image_url";
    pub const PAGE_COUNT: &str = "page_count";

    pub fn tags_in(lang: &str) -> String {
        format!("tags_{lang}")
    }

    pub fn genre_in(lang: &str) -> String {
        format!("genre_{lang}")
    }

    pub fn type_in(lang: &str) -> String {
        format!("type_{lang}")
    }
}

/// (canonical/current name, legacy name). Fields without a legacy
/// counterpart are read under their canonical name only.
const FIELD_MAP: &[(&str, &str)] = &[
    ("work_id", "teose_id"),
    ("page_number", "lk"),
    ("title", "pealkiri"),
    ("year", "aasta"),
    ("location", "koht"),
    ("publisher", "trykkal"),
    ("text", "tekst"),
    ("status", "staatus"),
    ("tags", "page_tags"),
    ("image_url", "pilt"),
    ("source_path", "failitee"),
    ("catalog", "kataloog"),
    ("modified_at", "muudetud"),
];

fn legacy_name(canonical: &str) -> Option<&'static str> {
    FIELD_MAP
        .iter()
        .find(|(c, _)| *c == canonical)
        .map(|(_, l)| *l)
}

/// Current-schema value if present and non-null, else the legacy value.
pub fn read_field<'a>(doc: &'a Map<String, Value>, canonical: &str) -> Option<&'a Value> {
    let current = doc.get(canonical).filter(|v| !v.is_null());
    current.or_else(|| {
        legacy_name(canonical)
            .and_then(|l| doc.get(l))
            .filter(|v| !v.is_null())
    })
}

pub(crate) fn read_string(doc: &Map<String, Value>, canonical: &str) -> Option<String> {
    match read_field(doc, canonical)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn read_u32(doc: &Map<String, Value>, canonical: &str) -> Option<u32> {
    match read_field(doc, canonical)? {
        Value::Number(n) => n.as_u64().map(|v| v as u32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn read_i64(doc: &Map<String, Value>, canonical: &str) -> Option<i64> {
    match read_field(doc, canonical)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn read_datetime(doc: &Map<String, Value>, canonical: &str) -> Option<DateTime<Utc>> {
    read_string(doc, canonical)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Creators of either document generation. The current schema carries a
/// structured `creators` list; legacy documents carry flat name fields
/// instead, where `autor` was the praeses by convention.
pub fn read_creators(doc: &Map<String, Value>) -> Vec<Creator> {
    if let Some(creators) = doc
        .get("creators")
        .and_then(|v| serde_json::from_value::<Vec<Creator>>(v.clone()).ok())
    {
        return creators;
    }
    let mut creators = Vec::new();
    if let Some(name) = doc.get("autor").and_then(Value::as_str) {
        creators.push(Creator {
            name: name.to_string(),
            role: CreatorRole::Praeses,
            entity: None,
        });
    }
    if let Some(name) = doc.get("respondens").and_then(Value::as_str) {
        creators.push(Creator {
            name: name.to_string(),
            role: CreatorRole::Respondens,
            entity: None,
        });
    }
    creators
}

/// Lower-case plain string tags and drop case-insensitive duplicates,
/// keeping the first occurrence. Linked-entity tags pass through untouched.
pub fn normalize_tags(tags: Vec<MetadataValue>) -> Vec<MetadataValue> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        match tag {
            MetadataValue::Plain(s) => {
                let lower = s.to_lowercase();
                if seen.insert(lower.clone()) {
                    out.push(MetadataValue::Plain(lower));
                }
            }
            linked @ MetadataValue::Linked(_) => out.push(linked),
        }
    }
    out
}

/// Build a [`Page`] from a raw index document of either schema generation.
pub fn page_from_doc(doc: &Value) -> Result<Page> {
    let map = doc
        .as_object()
        .ok_or_else(|| Error::InvalidDocument("page document is not an object".into()))?;

    let id = read_string(map, fields::ID)
        .ok_or_else(|| Error::InvalidDocument("page document has no id".into()))?;
    let work_id = read_string(map, "work_id")
        .ok_or_else(|| Error::InvalidDocument(format!("page {id} has no work identifier")))?;
    let page_number = read_u32(map, "page_number")
        .ok_or_else(|| Error::InvalidDocument(format!("page {id} has no page number")))?;

    let status: PageStatus = read_field(map, "status")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    let work_status: Option<WorkStatus> = map
        .get(fields::WORK_STATUS)
        .and_then(|v| serde_json::from_value(v.clone()).ok());

    let tags: Vec<MetadataValue> = read_field(map, "tags")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    let comments: Vec<Comment> = map
        .get("comments")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    let history: Vec<HistoryEntry> = map
        .get("history")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    let modified_at = read_datetime(map, "modified_at");

    Ok(Page {
        id,
        work_id,
        page_number,
        text: read_string(map, "text").unwrap_or_default(),
        status,
        tags: normalize_tags(tags),
        comments,
        history,
        work_status,
        image_url: read_string(map, "image_url"),
        source_path: read_string(map, "source_path"),
        catalog: read_string(map, "catalog"),
        modified_at,
    })
}

/// Partial update document for a page save: current-schema names only.
/// `work_status` is deliberately absent; the rollup writes it separately.
pub fn page_to_partial_doc(page: &Page) -> Result<Value> {
    Ok(serde_json::json!({
        "id": page.id,
        "work_id": page.work_id,
        "page_number": page.page_number,
        "text": page.text,
        "status": page.status,
        "tags": page.tags,
        "comments": page.comments,
        "history": page.history,
        "modified_at": page.modified_at.map(|t| t.to_rfc3339()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_only_document_normalizes() {
        let doc = json!({
            "id": "a-1",
            "teose_id": "dorpat-1632-mueller",
            "lk": 3,
            "tekst": "Quod felix faustumque sit",
            "staatus": "corrected",
            "pealkiri": "Disputatio",
        });
        let page = page_from_doc(&doc).unwrap();
        assert_eq!(page.work_id, "dorpat-1632-mueller");
        assert_eq!(page.page_number, 3);
        assert_eq!(page.text, "Quod felix faustumque sit");
        assert_eq!(page.status, PageStatus::Corrected);
    }

    #[test]
    fn current_schema_wins_over_legacy() {
        let doc = json!({
            "id": "a-1",
            "work_id": "W07k2",
            "teose_id": "dorpat-1632-mueller",
            "page_number": 4,
            "lk": 9,
            "text": "new text",
            "tekst": "old text",
        });
        let page = page_from_doc(&doc).unwrap();
        assert_eq!(page.work_id, "W07k2");
        assert_eq!(page.page_number, 4);
        assert_eq!(page.text, "new text");
    }

    #[test]
    fn null_current_field_falls_back_to_legacy() {
        let doc = json!({
            "id": "a-1",
            "work_id": "W07k2",
            "page_number": 1,
            "text": null,
            "tekst": "vana tekst",
        });
        let page = page_from_doc(&doc).unwrap();
        assert_eq!(page.text, "vana tekst");
    }

    #[test]
    fn missing_status_defaults_to_raw() {
        let doc = json!({"id": "a-1", "work_id": "w", "page_number": 1});
        let page = page_from_doc(&doc).unwrap();
        assert_eq!(page.status, PageStatus::Raw);
        assert!(page.tags.is_empty());
        assert!(page.history.is_empty());
    }

    #[test]
    fn tag_normalization_dedups_case_insensitively() {
        let tags = vec![
            MetadataValue::Plain("Foo".into()),
            MetadataValue::Plain("foo".into()),
            MetadataValue::Plain("BAR".into()),
        ];
        let normalized = normalize_tags(tags);
        assert_eq!(
            normalized,
            vec![
                MetadataValue::Plain("foo".into()),
                MetadataValue::Plain("bar".into()),
            ]
        );
    }

    #[test]
    fn tag_normalization_is_idempotent() {
        let tags = vec![
            MetadataValue::Plain("Foo".into()),
            MetadataValue::Plain("foo".into()),
            MetadataValue::Linked(crate::model::LinkedEntity::manual("Väitekiri")),
        ];
        let once = normalize_tags(tags);
        let twice = normalize_tags(once.clone());
        assert_eq!(once, twice);
        // Linked tags are not lower-cased.
        assert!(matches!(&once[1], MetadataValue::Linked(e) if e.label == "Väitekiri"));
    }

    #[test]
    fn legacy_flat_names_become_creators() {
        let doc = json!({
            "autor": "Friedrich Menius",
            "respondens": "Jaan Tamm",
        });
        let creators = read_creators(doc.as_object().unwrap());
        assert_eq!(creators.len(), 2);
        assert_eq!(creators[0].name, "Friedrich Menius");
        assert_eq!(creators[0].role, CreatorRole::Praeses);
        assert_eq!(creators[1].name, "Jaan Tamm");
        assert_eq!(creators[1].role, CreatorRole::Respondens);
    }

    #[test]
    fn structured_creators_win_over_flat_names() {
        let doc = json!({
            "creators": [{"name": "Andreas Virginius", "role": "author"}],
            "autor": "ignored",
        });
        let creators = read_creators(doc.as_object().unwrap());
        assert_eq!(creators.len(), 1);
        assert_eq!(creators[0].role, CreatorRole::Author);
    }

    #[test]
    fn partial_doc_uses_current_names_only() {
        let page = page_from_doc(&json!({
            "id": "a-1",
            "teose_id": "w-legacy",
            "lk": 2,
            "tekst": "tekst",
        }))
        .unwrap();
        let doc = page_to_partial_doc(&page).unwrap();
        let obj = doc.as_object().unwrap();
        assert!(obj.contains_key("work_id"));
        assert!(obj.contains_key("text"));
        assert!(!obj.contains_key("teose_id"));
        assert!(!obj.contains_key("tekst"));
        assert!(!obj.contains_key("work_status"));
    }
}
