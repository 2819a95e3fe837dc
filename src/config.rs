//! Editor configuration loaded from a TOML file.
//!
//! Lookup order: the `--config` path if given, else `duckpond.toml` in the
//! working directory, else built-in defaults. The Firestore API key can also
//! come from `DUCKPOND_FIRESTORE_API_KEY`, which wins over the file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::interaction::InteractionSettings;
use crate::persistence::{
    FileStore, FirestoreConfig, FirestoreStore, MemoryStore, PersistenceError, StateStore,
};

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_CONFIG_FILE: &str = "duckpond.toml";
pub const API_KEY_ENV: &str = "DUCKPOND_FIRESTORE_API_KEY";
const DEFAULT_STATE_FILE: &str = "duckpond_state.json";
const DEFAULT_ASSET: &str = "assets/Duck.glb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to create persistence backend: {0}")]
    Store(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub window_title: String,
    pub camera: CameraConfig,
    pub interaction: InteractionSettings,
    pub persistence: PersistenceConfig,
    pub objects: Vec<ObjectConfig>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            window_title: "duckpond".to_string(),
            camera: CameraConfig::default(),
            interaction: InteractionSettings::default(),
            persistence: PersistenceConfig::default(),
            objects: vec![
                ObjectConfig::new("duck", DEFAULT_ASSET, [-1.5, 0.0, 0.0]),
                ObjectConfig::new("duck2", DEFAULT_ASSET, [1.5, 0.0, 0.0]),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view.
    pub fov_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { fov_degrees: 50.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum PersistenceConfig {
    Memory,
    File { path: PathBuf },
    Firestore(FirestoreConfig),
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig::File {
            path: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}

impl PersistenceConfig {
    pub fn build_store(&self) -> Result<Arc<dyn StateStore>, ConfigError> {
        Ok(match self {
            PersistenceConfig::Memory => Arc::new(MemoryStore::new()),
            PersistenceConfig::File { path } => {
                let store = FileStore::new(path.clone());
                if !store.path().exists() {
                    log::info!("{} does not exist yet, starting empty", path.display());
                }
                Arc::new(store)
            }
            PersistenceConfig::Firestore(config) => Arc::new(FirestoreStore::new(config)?),
        })
    }

    pub fn describe(&self) -> String {
        match self {
            PersistenceConfig::Memory => "in-memory store".to_string(),
            PersistenceConfig::File { path } => format!("file {}", path.display()),
            PersistenceConfig::Firestore(config) => format!(
                "firestore project {} collection {}",
                config.project_id, config.collection
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub id: String,
    pub asset: PathBuf,
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation_y_degrees: f32,
}

impl ObjectConfig {
    pub fn new(id: impl Into<String>, asset: impl Into<PathBuf>, position: [f32; 3]) -> Self {
        Self {
            id: id.into(),
            asset: asset.into(),
            position,
            rotation_y_degrees: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

impl EditorConfig {
    /// Loads, applies the environment override and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    log::info!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_api_key(std::env::var(API_KEY_ENV).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replaces the Firestore API key when `key` is set and non-empty.
    pub fn apply_api_key(&mut self, key: Option<String>) {
        let Some(key) = key.filter(|key| !key.trim().is_empty()) else {
            return;
        };

        if let PersistenceConfig::Firestore(firestore) = &mut self.persistence {
            firestore.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fov = self.camera.fov_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be between 0 and 180, got {fov}"
            )));
        }

        let margin = self.interaction.collision_margin;
        if !margin.is_finite() || margin < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "interaction.collision_margin must be a non-negative number, got {margin}"
            )));
        }

        if !self.interaction.rotate_sensitivity.is_finite() {
            return Err(ConfigError::Invalid(
                "interaction.rotate_sensitivity must be finite".to_string(),
            ));
        }

        if let PersistenceConfig::Firestore(firestore) = &self.persistence {
            if firestore.project_id.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "persistence.project_id must not be empty".to_string(),
                ));
            }
        }

        let mut seen = HashSet::new();
        for object in &self.objects {
            if object.id.trim().is_empty() || object.id.contains('/') {
                return Err(ConfigError::Invalid(format!(
                    "object id {:?} must be non-empty and must not contain '/'",
                    object.id
                )));
            }
            if !seen.insert(object.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "object id {:?} is used more than once",
                    object.id
                )));
            }
        }

        Ok(())
    }
}
