//! External authority lookups backing the linked-entity pickers.
//!
//! All three services are optional enrichments: each call is independently
//! time-boxed and a failure never blocks the save or search paths — the
//! editor simply gets no suggestions.

pub mod gnd;
pub mod viaf;
pub mod wikidata;

pub use gnd::GndClient;
pub use viaf::ViafClient;
pub use wikidata::WikidataClient;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::AuthoritySource;

pub(crate) const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// One candidate from an authority search, ready to become a
/// [`crate::model::LinkedEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityHit {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub source: AuthoritySource,
}

pub(crate) fn lookup_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(LOOKUP_TIMEOUT)
        .build()
        .map_err(Into::into)
}

pub(crate) fn lookup_error(service: &str, err: impl std::fmt::Display) -> Error {
    Error::Authority {
        service: service.to_string(),
        message: err.to_string(),
    }
}
