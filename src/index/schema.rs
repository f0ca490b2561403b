//! Lazy schema convergence for the search index.
//!
//! The query layer needs a specific set of searchable, sortable and
//! filterable attributes and an exactness-first ranking order. Instead of a
//! separate migration step, the first query of a session triggers one
//! inspection and, when needed, one bulk settings update. Convergence is an
//! optimization, not a correctness precondition: on failure the system
//! proceeds optimistically and queries against unconverged attributes fail
//! with a recoverable warming error.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::settings::{FacetingSettings, PaginationSettings};
use super::{IndexClient, IndexSettings};
use crate::model::raw::fields;

pub const REQUIRED_SEARCHABLE: &[&str] =
    &[fields::TEXT, fields::TITLE, fields::TAGS_FLAT, fields::COMMENT_TEXT];

pub const REQUIRED_SORTABLE: &[&str] = &[
    fields::YEAR,
    fields::TITLE,
    fields::MODIFIED_AT,
    fields::PAGE_NUMBER,
];

pub const REQUIRED_FILTERABLE: &[&str] = &[
    fields::WORK_ID,
    fields::WORK_ID_LEGACY,
    fields::PAGE_NUMBER,
    fields::YEAR,
    fields::STATUS,
    fields::WORK_STATUS,
    fields::AUTHORS,
    fields::RESPONDENS,
    fields::PUBLISHER,
    fields::COLLECTION_PATH,
    fields::CATALOG,
    "tags_et",
    "tags_en",
    "genre_et",
    "genre_en",
    "type_et",
    "type_en",
];

/// Exactness ahead of the term-matching rules, so short exact titles beat
/// long fuzzy matches on the dashboard.
pub const RANKING_RULES: &[&str] = &["exactness", "words", "typo", "proximity", "attribute", "sort"];

const MAX_VALUES_PER_FACET: usize = 10_000;
const MAX_TOTAL_HITS: usize = 100_000;

/// Ensures the index is queryable, once per process lifetime. The first
/// caller triggers the check; all concurrent and later callers await the
/// same outcome. The outcome is never retried.
pub struct SchemaManager {
    index: Arc<dyn IndexClient>,
    ready: OnceCell<()>,
}

impl SchemaManager {
    pub fn new(index: Arc<dyn IndexClient>) -> Self {
        Self {
            index,
            ready: OnceCell::new(),
        }
    }

    /// Idempotent, memoized, non-fatal. Errors during inspection or update
    /// are logged and swallowed.
    pub async fn ensure_ready(&self) {
        self.ready
            .get_or_init(|| async {
                match self.converge().await {
                    Ok(true) => info!(host = self.index.host(), "index settings updated"),
                    Ok(false) => debug!("index settings already satisfy requirements"),
                    Err(err) => warn!(
                        host = self.index.host(),
                        error = %err,
                        "schema convergence failed, proceeding optimistically"
                    ),
                }
            })
            .await;
    }

    /// Returns whether a settings write was issued.
    async fn converge(&self) -> crate::error::Result<bool> {
        let current = self.index.settings().await?;
        if settings_satisfy(&current) {
            return Ok(false);
        }
        let desired = desired_settings();
        self.index.apply_settings(&desired).await?;
        Ok(true)
    }
}

pub(crate) fn settings_satisfy(settings: &IndexSettings) -> bool {
    REQUIRED_SEARCHABLE.iter().all(|a| settings.has_searchable(a))
        && REQUIRED_SORTABLE.iter().all(|a| settings.has_sortable(a))
        && REQUIRED_FILTERABLE.iter().all(|a| settings.has_filterable(a))
        && settings.exactness_first()
        && settings.distinct_attribute.is_none()
}

pub(crate) fn desired_settings() -> IndexSettings {
    IndexSettings {
        searchable_attributes: REQUIRED_SEARCHABLE.iter().map(|s| s.to_string()).collect(),
        sortable_attributes: REQUIRED_SORTABLE.iter().map(|s| s.to_string()).collect(),
        filterable_attributes: REQUIRED_FILTERABLE.iter().map(|s| s.to_string()).collect(),
        ranking_rules: RANKING_RULES.iter().map(|s| s.to_string()).collect(),
        distinct_attribute: None,
        faceting: Some(FacetingSettings {
            max_values_per_facet: MAX_VALUES_PER_FACET,
        }),
        pagination: Some(PaginationSettings {
            max_total_hits: MAX_TOTAL_HITS,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desired_settings_satisfy_their_own_check() {
        assert!(settings_satisfy(&desired_settings()));
    }

    #[test]
    fn wildcard_searchable_counts_as_present() {
        let mut settings = desired_settings();
        settings.searchable_attributes = vec!["*".into()];
        assert!(settings_satisfy(&settings));
    }

    #[test]
    fn missing_filterable_attribute_fails_check() {
        let mut settings = desired_settings();
        settings
            .filterable_attributes
            .retain(|a| a != fields::WORK_STATUS);
        assert!(!settings_satisfy(&settings));
    }

    #[test]
    fn global_distinct_fails_check() {
        let mut settings = desired_settings();
        settings.distinct_attribute = Some(fields::WORK_ID.into());
        assert!(!settings_satisfy(&settings));
    }

    #[test]
    fn settings_update_body_clears_global_distinct() {
        // The settings write is a PATCH; without an explicit null a stale
        // global distinct would survive the update it is meant to undo.
        let body = serde_json::to_value(desired_settings()).unwrap();
        assert_eq!(body["distinctAttribute"], serde_json::Value::Null);
    }

    #[test]
    fn exactness_behind_words_fails_check() {
        let mut settings = desired_settings();
        settings.ranking_rules =
            vec!["words".into(), "typo".into(), "exactness".into(), "sort".into()];
        assert!(!settings_satisfy(&settings));
    }
}
