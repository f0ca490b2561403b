//! VIAF person search over the SRU endpoint.
//!
//! Authority headings arrive surname-first with trailing date or century
//! qualifiers ("Tamm, Jaan, 1650-1700."); VIAF's keyword search works much
//! better on the natural given-name-first form, so names are normalized
//! before querying.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{lookup_client, lookup_error, AuthorityHit};
use crate::error::Result;
use crate::model::AuthoritySource;

const DEFAULT_ENDPOINT: &str = "https://viaf.org/viaf/search";

pub struct ViafClient {
    client: reqwest::Client,
    endpoint: String,
}

/// Surname-first → given-name-first, with trailing date/century qualifiers
/// stripped. Names without a comma pass through unchanged.
pub fn normalize_name(name: &str) -> String {
    static QUALIFIER: OnceLock<Regex> = OnceLock::new();
    // Trailing segments like "1650-1700", "u.1650", "17. saj." or "fl. 1680".
    let qualifier = QUALIFIER.get_or_init(|| {
        Regex::new(r"(?i),?\s*((u\.|ca\.?|fl\.?\s*)?\d{3,4}(\s*[-–]\s*\d{0,4})?\.?|\d{1,2}\.?\s*saj\.?)\s*$").unwrap()
    });
    let mut trimmed = name.trim().to_string();
    loop {
        let stripped = qualifier.replace(&trimmed, "").trim().to_string();
        if stripped == trimmed {
            break;
        }
        trimmed = stripped;
    }
    let trimmed = trimmed.trim_end_matches([',', '.']).trim();

    match trimmed.split_once(',') {
        Some((surname, given)) if !given.trim().is_empty() => {
            format!("{} {}", given.trim(), surname.trim())
        }
        _ => trimmed.to_string(),
    }
}

impl ViafClient {
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

    pub async fn search_person(&self, name: &str) -> Result<Vec<AuthorityHit>> {
        let normalized = normalize_name(name);
        let query = format!("local.personalNames all \"{normalized}\"");
        let body: Value = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", query.as_str()),
                ("maximumRecords", "10"),
                ("httpAccept", "application/json"),
            ])
            .send()
            .await
            .map_err(|e| lookup_error("viaf", e))?
            .json()
            .await
            .map_err(|e| lookup_error("viaf", e))?;

        Ok(parse_records(&body))
    }
}

/// Walk the SRU JSON envelope defensively; VIAF record shapes vary between
/// single-object and array forms at several levels.
fn parse_records(body: &Value) -> Vec<AuthorityHit> {
    let records = match body
        .pointer("/searchRetrieveResponse/records/record")
    {
        Some(Value::Array(records)) => records.clone(),
        Some(single @ Value::Object(_)) => vec![single.clone()],
        _ => return Vec::new(),
    };

    records
        .iter()
        .filter_map(|record| {
            let data = record.pointer("/recordData/VIAFCluster")?;
            let id = data.get("viafID").and_then(value_as_string)?;
            let heading = data.pointer("/mainHeadings/data");
            let label = match heading {
                Some(Value::Array(entries)) => entries.first()?.get("text")?.as_str()?.to_string(),
                Some(Value::Object(entry)) => entry.get("text")?.as_str()?.to_string(),
                _ => return None,
            };
            Some(AuthorityHit {
                id,
                label,
                description: None,
                source: AuthoritySource::Viaf,
            })
        })
        .collect()
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
