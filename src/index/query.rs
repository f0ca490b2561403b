//! Query and response types for the search index.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Boolean filter expression over named document fields, rendered to the
/// index's filter syntax on serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Exact match; on array fields this matches any element.
    Eq(String, String),
    /// Numeric equality.
    EqNum(String, i64),
    Ge(String, i64),
    Le(String, i64),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::Eq(field.into(), value.into())
    }

    pub fn and(exprs: Vec<FilterExpr>) -> Option<Self> {
        match exprs.len() {
            0 => None,
            1 => exprs.into_iter().next(),
            _ => Some(FilterExpr::And(exprs)),
        }
    }

    /// Render to the index filter syntax. String values are quoted with
    /// backslash escaping so titles and slugs cannot break the expression.
    pub fn render(&self) -> String {
        fn quote(value: &str) -> String {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        }
        fn join(exprs: &[FilterExpr], op: &str) -> String {
            let parts: Vec<String> = exprs.iter().map(render_nested).collect();
            parts.join(&format!(" {op} "))
        }
        fn render_nested(expr: &FilterExpr) -> String {
            match expr {
                FilterExpr::And(_) | FilterExpr::Or(_) => format!("({})", expr.render()),
                other => other.render(),
            }
        }
        match self {
            FilterExpr::Eq(field, value) => format!("{field} = {}", quote(value)),
            FilterExpr::EqNum(field, value) => format!("{field} = {value}"),
            FilterExpr::Ge(field, value) => format!("{field} >= {value}"),
            FilterExpr::Le(field, value) => format!("{field} <= {value}"),
            FilterExpr::And(exprs) => join(exprs, "AND"),
            FilterExpr::Or(exprs) => join(exprs, "OR"),
        }
    }
}

/// Snippet cropping and highlight configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropConfig {
    pub attributes: Vec<String>,
    pub crop_length: usize,
    pub pre_tag: String,
    pub post_tag: String,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            attributes: Vec::new(),
            crop_length: default_crop_length(),
            pre_tag: default_pre_tag(),
            post_tag: default_post_tag(),
        }
    }
}

fn default_crop_length() -> usize {
    30
}
fn default_pre_tag() -> String {
    "<em>".to_string()
}
fn default_post_tag() -> String {
    "</em>".to_string()
}

/// One search request. Field semantics follow the index contract: `distinct`
/// collapses to one hit per value of the named field, `facets` requests
/// value→count distributions independent of pagination, `limit: 0` is a
/// legal facet-only query.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub q: String,
    pub filter: Option<FilterExpr>,
    pub sort: Vec<String>,
    pub distinct: Option<String>,
    pub facets: Vec<String>,
    pub limit: usize,
    pub offset: usize,
    /// Restrict term matching to these attributes; `None` searches all
    /// searchable attributes.
    pub attributes_to_search_on: Option<Vec<String>>,
    pub crop: Option<CropConfig>,
}

impl SearchQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            limit: 20,
            ..Default::default()
        }
    }
}

/// One hit: the raw document plus optional formatted (cropped/highlighted)
/// counterpart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<Value>,
}

impl SearchHit {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.document.get(name).filter(|v| !v.is_null())
    }

    pub fn string_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn formatted_field(&self, name: &str) -> Option<&str> {
        self.formatted
            .as_ref()
            .and_then(|f| f.get(name))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub estimated_total_hits: u64,
    #[serde(default)]
    pub facet_distribution: HashMap<String, HashMap<String, u64>>,
}

impl SearchResponse {
    /// Facet count for one value of one field.
    pub fn facet_count(&self, field: &str, value: &str) -> Option<u64> {
        self.facet_distribution.get(field)?.get(value).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_comparisons_and_equality() {
        assert_eq!(
            FilterExpr::eq("work_id", "W07k2").render(),
            "work_id = \"W07k2\""
        );
        assert_eq!(FilterExpr::Ge("year".into(), 1632).render(), "year >= 1632");
        assert_eq!(FilterExpr::Le("year".into(), 1710).render(), "year <= 1710");
        assert_eq!(
            FilterExpr::EqNum("page_number".into(), 1).render(),
            "page_number = 1"
        );
    }

    #[test]
    fn renders_nested_boolean_composition() {
        let expr = FilterExpr::And(vec![
            FilterExpr::Or(vec![
                FilterExpr::eq("work_id", "w1"),
                FilterExpr::eq("teose_id", "w1"),
            ]),
            FilterExpr::EqNum("page_number".into(), 4),
        ]);
        assert_eq!(
            expr.render(),
            "(work_id = \"w1\" OR teose_id = \"w1\") AND page_number = 4"
        );
    }

    #[test]
    fn escapes_quotes_in_values() {
        let expr = FilterExpr::eq("title", "an \"odd\" title");
        assert_eq!(expr.render(), "title = \"an \\\"odd\\\" title\"");
    }

    #[test]
    fn and_of_one_collapses() {
        let expr = FilterExpr::and(vec![FilterExpr::eq("a", "b")]).unwrap();
        assert_eq!(expr, FilterExpr::eq("a", "b"));
        assert!(FilterExpr::and(vec![]).is_none());
    }

    #[test]
    fn facet_count_lookup() {
        let mut dist = HashMap::new();
        dist.insert(
            "work_id".to_string(),
            HashMap::from([("w1".to_string(), 5u64)]),
        );
        let resp = SearchResponse {
            hits: vec![],
            estimated_total_hits: 5,
            facet_distribution: dist,
        };
        assert_eq!(resp.facet_count("work_id", "w1"), Some(5));
        assert_eq!(resp.facet_count("work_id", "w2"), None);
    }
}
