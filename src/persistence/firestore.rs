//! Firestore REST v1 backend.
//!
//! Documents live at `{collection}/{id}`. Saves are `PATCH` requests with an
//! update mask naming `position` and `rotation`, which is how the REST API
//! spells a merge write. Encoding to Firestore's typed values is kept in pure
//! functions so it can be tested without a network.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{PersistedState, PersistenceError, StateStore, VectorData};

#[cfg(test)]
#[path = "firestore_test.rs"]
mod tests;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_COLLECTION: &str = "models";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 5;
const MERGED_FIELDS: [&str; 2] = ["position", "rotation"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

pub struct FirestoreStore {
    http: reqwest::Client,
    collection_url: Url,
    api_key: Option<String>,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> Result<Self, PersistenceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        let collection_url = Url::parse(&collection_url(config)).map_err(|err| {
            PersistenceError::Malformed(format!("invalid firestore base url: {err}"))
        })?;

        Ok(Self {
            http,
            collection_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Object ids become a single escaped path segment.
    fn document_url(&self, id: &str) -> Result<Url, PersistenceError> {
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                PersistenceError::Malformed(format!("{} cannot take a path", self.collection_url))
            })?
            .push(id);
        Ok(url)
    }

    fn key_query(&self) -> Vec<(&'static str, String)> {
        self.api_key
            .iter()
            .map(|key| ("key", key.clone()))
            .collect()
    }
}

pub(crate) fn collection_url(config: &FirestoreConfig) -> String {
    format!(
        "{}/projects/{}/databases/(default)/documents/{}",
        config.base_url.trim_end_matches('/'),
        config.project_id,
        config.collection
    )
}

#[async_trait::async_trait]
impl StateStore for FirestoreStore {
    async fn load_state(&self, id: &str) -> Result<Option<PersistedState>, PersistenceError> {
        let response = self
            .http
            .get(self.document_url(id)?)
            .query(&self.key_query())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(PersistenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let document: Value = serde_json::from_str(&body)?;
        decode_document(&document)
    }

    async fn save_state(&self, id: &str, state: &PersistedState) -> Result<(), PersistenceError> {
        let mut query: Vec<(&'static str, String)> = MERGED_FIELDS
            .iter()
            .map(|field| ("updateMask.fieldPaths", (*field).to_string()))
            .collect();
        query.extend(self.key_query());

        let response = self
            .http
            .patch(self.document_url(id)?)
            .query(&query)
            .json(&encode_document(state))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

// =============================================================================
// WIRE ENCODING
// =============================================================================

fn encode_vector(vector: &VectorData) -> Value {
    json!({
        "mapValue": {
            "fields": {
                "x": { "doubleValue": vector.x },
                "y": { "doubleValue": vector.y },
                "z": { "doubleValue": vector.z },
            }
        }
    })
}

pub(crate) fn encode_document(state: &PersistedState) -> Value {
    json!({
        "fields": {
            "position": encode_vector(&state.position),
            "rotation": encode_vector(&state.rotation),
        }
    })
}

fn decode_number(value: &Value, path: &str) -> Result<f64, PersistenceError> {
    if let Some(number) = value.get("doubleValue").and_then(Value::as_f64) {
        return Ok(number);
    }

    // 64-bit integers travel as strings.
    if let Some(integer) = value.get("integerValue") {
        let parsed = match integer {
            Value::String(text) => text.parse::<i64>().ok(),
            other => other.as_i64(),
        };
        if let Some(integer) = parsed {
            return Ok(integer as f64);
        }
    }

    Err(PersistenceError::Malformed(format!("{path} is not a number")))
}

fn map_fields<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, PersistenceError> {
    value
        .get("mapValue")
        .and_then(|map| map.get("fields"))
        .and_then(Value::as_object)
        .ok_or_else(|| PersistenceError::Malformed(format!("{path} is not a map")))
}

fn decode_vector(value: &Value, path: &str) -> Result<VectorData, PersistenceError> {
    let fields = map_fields(value, path)?;
    let component = |axis: &str| {
        let component_path = format!("{path}.{axis}");
        fields
            .get(axis)
            .ok_or_else(|| PersistenceError::Malformed(format!("{component_path} is missing")))
            .and_then(|value| decode_number(value, &component_path))
    };

    Ok(VectorData {
        x: component("x")?,
        y: component("y")?,
        z: component("z")?,
    })
}

/// Reads a Firestore document resource. Missing `position` or `rotation`
/// means there is no usable state yet.
pub(crate) fn decode_document(document: &Value) -> Result<Option<PersistedState>, PersistenceError> {
    let Some(fields) = document.get("fields").and_then(Value::as_object) else {
        return Ok(None);
    };

    let (Some(position), Some(rotation)) = (fields.get("position"), fields.get("rotation")) else {
        return Ok(None);
    };

    Ok(Some(PersistedState {
        position: decode_vector(position, "position")?,
        rotation: decode_vector(rotation, "rotation")?,
    }))
}
