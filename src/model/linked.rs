//! Metadata values that may be plain strings or authority-backed entities.
//!
//! Bibliographic fields (genre, type, tags, creator identities) arrived in
//! two generations: bare strings typed by editors, and linked entities
//! attached from external authority records. Both shapes coexist in the
//! index; the untagged union keeps them distinguishable without `typeof`
//! branching spread through the services.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Linked(LinkedEntity),
    Plain(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthoritySource {
    Wikidata,
    Viaf,
    AlbumAcademicum,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntity {
    /// External authority record id; `None` exactly when `source` is manual.
    pub id: Option<String>,
    pub label: String,
    pub source: AuthoritySource,
    /// Per-language labels keyed by BCP 47 code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

impl LinkedEntity {
    pub fn new(id: Option<String>, label: impl Into<String>, source: AuthoritySource) -> Result<Self> {
        let entity = Self {
            id,
            label: label.into(),
            source,
            labels: None,
        };
        entity.validate()?;
        Ok(entity)
    }

    pub fn manual(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            source: AuthoritySource::Manual,
            labels: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match (self.source, &self.id) {
            (AuthoritySource::Manual, Some(id)) => Err(Error::InvalidDocument(format!(
                "manual entity '{}' must not carry an external id (got {id})",
                self.label
            ))),
            (AuthoritySource::Manual, None) => Ok(()),
            (source, None) => Err(Error::InvalidDocument(format!(
                "{source:?} entity '{}' is missing its external id",
                self.label
            ))),
            (_, Some(_)) => Ok(()),
        }
    }

    /// Browsable URL of the backing authority record. Only Wikidata and VIAF
    /// records resolve to public pages.
    pub fn external_url(&self) -> Option<String> {
        let id = self.id.as_deref()?;
        match self.source {
            AuthoritySource::Wikidata => Some(format!("https://www.wikidata.org/wiki/{id}")),
            AuthoritySource::Viaf => Some(format!("https://viaf.org/viaf/{id}")),
            AuthoritySource::AlbumAcademicum | AuthoritySource::Manual => None,
        }
    }

    /// Label in the requested language, falling back to the generic label.
    pub fn label_in(&self, lang: &str) -> &str {
        self.labels
            .as_ref()
            .and_then(|m| m.get(lang))
            .map(String::as_str)
            .unwrap_or(&self.label)
    }
}

/// Display label for either shape of metadata value.
pub fn resolve_label<'a>(value: &'a MetadataValue, lang: &str) -> &'a str {
    match value {
        MetadataValue::Plain(s) => s,
        MetadataValue::Linked(e) => e.label_in(lang),
    }
}
