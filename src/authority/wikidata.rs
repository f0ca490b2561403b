//! Wikidata entity search and multilingual label fetch.

use serde::Deserialize;
use std::collections::HashMap;

use super::{lookup_client, lookup_error, AuthorityHit};
use crate::error::Result;
use crate::model::AuthoritySource;

const DEFAULT_ENDPOINT: &str = "https://www.wikidata.org/w/api.php";

pub struct WikidataClient {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<SearchEntry>,
}

#[derive(Deserialize)]
struct SearchEntry {
    id: String,
    label: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, Entity>,
}

#[derive(Deserialize)]
struct Entity {
    #[serde(default)]
    labels: HashMap<String, LabelValue>,
}

#[derive(Deserialize)]
struct LabelValue {
    value: String,
}

impl WikidataClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: lookup_client()?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: lookup_client()?,
            endpoint: endpoint.into(),
        })
    }

    /// Search-as-you-type entity lookup in the given language.
    pub async fn search(&self, query: &str, lang: &str) -> Result<Vec<AuthorityHit>> {
        let response: SearchResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "wbsearchentities"),
                ("format", "json"),
                ("origin", "*"),
                ("language", lang),
                ("uselang", lang),
                ("search", query),
            ])
            .send()
            .await
            .map_err(|e| lookup_error("wikidata", e))?
            .json()
            .await
            .map_err(|e| lookup_error("wikidata", e))?;

        Ok(response
            .search
            .into_iter()
            .map(|entry| AuthorityHit {
                label: entry.label.unwrap_or_else(|| entry.id.clone()),
                id: entry.id,
                description: entry.description,
                source: AuthoritySource::Wikidata,
            })
            .collect())
    }

    /// Fetch per-language labels for one entity, for relabeling linked
    /// values in the editor's language.
    pub async fn labels(&self, entity_id: &str, langs: &[&str]) -> Result<HashMap<String, String>> {
        let languages = langs.join("|");
        let response: EntitiesResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "wbgetentities"),
                ("format", "json"),
                ("origin", "*"),
                ("props", "labels"),
                ("ids", entity_id),
                ("languages", languages.as_str()),
            ])
            .send()
            .await
            .map_err(|e| lookup_error("wikidata", e))?
            .json()
            .await
            .map_err(|e| lookup_error("wikidata", e))?;

        Ok(response
            .entities
            .into_values()
            .next()
            .map(|entity| {
                entity
                    .labels
                    .into_iter()
                    .map(|(lang, label)| (lang, label.value))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_payload() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"search":[{"id":"Q42","label":"Douglas Adams","description":"writer"},{"id":"Q5"}]}"#,
        )
        .unwrap();
        assert_eq!(response.search.len(), 2);
        assert_eq!(response.search[0].id, "Q42");
        assert!(response.search[1].label.is_none());
    }

    #[test]
    fn parses_labels_payload() {
        let response: EntitiesResponse = serde_json::from_str(
            r#"{"entities":{"Q42":{"labels":{"et":{"language":"et","value":"Douglas Adams"}}}}}"#,
        )
        .unwrap();
        let entity = response.entities.get("Q42").unwrap();
        assert_eq!(entity.labels.get("et").unwrap().value, "Douglas Adams");
    }
}
