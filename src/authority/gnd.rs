//! GND person search via lobid.org, with Wikidata cross-reference
//! extraction so a GND pick can be linked to its Wikidata entity directly.

use serde::Deserialize;
use serde_json::Value;

use super::{lookup_client, lookup_error};
use crate::error::Result;

const DEFAULT_ENDPOINT: &str = "https://lobid.org/gnd/search";

pub struct GndClient {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Clone)]
pub struct GndPerson {
    pub gnd_id: String,
    pub label: String,
    /// Q-id extracted from the record's sameAs links, when present.
    pub wikidata_id: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    member: Vec<Value>,
}

impl GndClient {
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

    pub async fn search_person(&self, name: &str) -> Result<Vec<GndPerson>> {
        let response: SearchResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", name),
                ("filter", "type:Person"),
                ("size", "10"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| lookup_error("gnd", e))?
            .json()
            .await
            .map_err(|e| lookup_error("gnd", e))?;

        Ok(response.member.iter().filter_map(parse_person).collect())
    }
}

fn parse_person(member: &Value) -> Option<GndPerson> {
    let gnd_id = member.get("gndIdentifier").and_then(Value::as_str)?;
    let label = member.get("preferredName").and_then(Value::as_str)?;
    Some(GndPerson {
        gnd_id: gnd_id.to_string(),
        label: label.to_string(),
        wikidata_id: wikidata_cross_reference(member),
    })
}

fn wikidata_cross_reference(member: &Value) -> Option<String> {
    let same_as = member.get("sameAs")?.as_array()?;
    same_as.iter().find_map(|entry| {
        let id = entry.get("id").and_then(Value::as_str)?;
        let (_, q_id) = id.split_once("wikidata.org/entity/")?;
        Some(q_id.to_string())
    })
}
