//! Per-object position/rotation documents in a key/value document store.
//!
//! The frame loop talks to [`PersistenceClient`], which runs every store call
//! on the tokio runtime. Backends implement [`StateStore`].

mod client;
mod file;
mod firestore;
mod memory;

use std::path::PathBuf;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use client::{LoadPoll, PendingLoad, PersistenceClient};
pub use file::FileStore;
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryStore;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed document: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Vec3> for VectorData {
    fn from(v: Vec3) -> Self {
        Self {
            x: f64::from(v.x),
            y: f64::from(v.y),
            z: f64::from(v.z),
        }
    }
}

impl From<VectorData> for Vec3 {
    fn from(v: VectorData) -> Self {
        Vec3::new(v.x as f32, v.y as f32, v.z as f32)
    }
}

/// Last committed transform of one object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub position: VectorData,
    pub rotation: VectorData,
}

impl PersistedState {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self {
            position: position.into(),
            rotation: rotation.into(),
        }
    }

    pub fn to_document(&self) -> Value {
        serde_json::json!({
            "position": self.position,
            "rotation": self.rotation,
        })
    }

    /// A document lacking either field is treated as absent, like a first run.
    pub fn from_document(document: &Value) -> Result<Option<Self>, PersistenceError> {
        let (Some(position), Some(rotation)) = (document.get("position"), document.get("rotation"))
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            position: VectorData::deserialize(position)?,
            rotation: VectorData::deserialize(rotation)?,
        }))
    }
}

#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    /// `Ok(None)` when no document exists for `id`.
    async fn load_state(&self, id: &str) -> Result<Option<PersistedState>, PersistenceError>;

    /// Merges `state` into the document for `id`, leaving other fields intact.
    async fn save_state(&self, id: &str, state: &PersistedState) -> Result<(), PersistenceError>;
}

/// Recursively merges `patch` into `target`. Objects merge key by key; any
/// other value replaces what was there.
pub fn merge_documents(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge_documents(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}
