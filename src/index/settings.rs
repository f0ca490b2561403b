//! Index settings document, as exchanged with the settings endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    #[serde(default)]
    pub searchable_attributes: Vec<String>,
    #[serde(default)]
    pub sortable_attributes: Vec<String>,
    #[serde(default)]
    pub filterable_attributes: Vec<String>,
    #[serde(default)]
    pub ranking_rules: Vec<String>,
    /// Global distinct attribute. Must stay unset: distinct is chosen per
    /// query, and a global value would silently collapse every result set.
    /// Always serialized, even when `None` — the settings update is a PATCH,
    /// and clearing a stale value requires an explicit null in the body.
    #[serde(default)]
    pub distinct_attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faceting: Option<FacetingSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetingSettings {
    pub max_values_per_facet: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationSettings {
    pub max_total_hits: usize,
}

impl IndexSettings {
    pub fn has_searchable(&self, attr: &str) -> bool {
        // A bare ["*"] means everything is searchable.
        self.searchable_attributes.iter().any(|a| a == attr || a == "*")
    }

    pub fn has_sortable(&self, attr: &str) -> bool {
        self.sortable_attributes.iter().any(|a| a == attr)
    }

    pub fn has_filterable(&self, attr: &str) -> bool {
        self.filterable_attributes.iter().any(|a| a == attr)
    }

    /// True when the exactness tie-break runs ahead of the term-matching
    /// rules, which the relevance-ranked work listing depends on.
    pub fn exactness_first(&self) -> bool {
        let pos = |name: &str| self.ranking_rules.iter().position(|r| r == name);
        match (pos("exactness"), pos("words")) {
            (Some(e), Some(w)) => e < w,
            _ => false,
        }
    }
}
