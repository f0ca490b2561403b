//! Search-index client abstraction.
//!
//! The index is an external document store with filtering, sorting,
//! distinct-by-field, faceting and highlight support. Everything above this
//! module talks to the [`IndexClient`] trait; the reqwest implementation in
//! [`remote`] targets a Meilisearch-style HTTP API.

pub mod client;
pub mod query;
pub mod remote;
pub mod schema;
pub mod settings;

pub use client::IndexClient;
pub use query::{CropConfig, FilterExpr, SearchHit, SearchQuery, SearchResponse};
pub use remote::RemoteIndex;
pub use schema::SchemaManager;
pub use settings::IndexSettings;

use std::sync::OnceLock;

use regex::Regex;

/// Does this index error message indicate a query against an attribute whose
/// settings have not converged yet? Such rejections are transient (the
/// schema manager's bulk update is still being applied) and are surfaced as
/// a retry signal instead of a generic failure.
pub fn is_schema_convergence_message(message: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)not (yet )?(searchable|filterable|sortable)|invalid_(search|facet|document)_(attributes?|fields?)|attribute .* is not",
        )
        .unwrap()
    });
    re.is_match(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_convergence_messages() {
        assert!(is_schema_convergence_message(
            "Attribute `comment_text` is not searchable."
        ));
        assert!(is_schema_convergence_message(
            "attribute tags_et is not filterable"
        ));
        assert!(is_schema_convergence_message(
            "invalid_search_attributes_to_search_on"
        ));
        assert!(!is_schema_convergence_message("connection refused"));
        assert!(!is_schema_convergence_message("document not found"));
    }
}
