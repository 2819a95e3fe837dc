use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::RwLock;

use super::{merge_documents, PersistedState, PersistenceError, StateStore};

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

/// All documents in one JSON object on disk, keyed by object id.
///
/// Saves replace the file atomically through a sibling temp file, and loads
/// never run while a save is in progress.
pub struct FileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Value, PersistenceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(empty_object()),
            Ok(content) => {
                let documents: Value = serde_json::from_str(&content)?;
                if !documents.is_object() {
                    return Err(PersistenceError::Malformed(format!(
                        "{} does not hold a JSON object",
                        self.path.display()
                    )));
                }
                Ok(documents)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(empty_object()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    async fn write_all(&self, documents: &Value) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let content = serde_json::to_string_pretty(documents)?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|source| PersistenceError::Io {
                path: temp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|source| self.io_error(source))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[async_trait::async_trait]
impl StateStore for FileStore {
    async fn load_state(&self, id: &str) -> Result<Option<PersistedState>, PersistenceError> {
        let _guard = self.lock.read().await;
        let documents = self.read_all().await?;
        match documents.get(id) {
            Some(document) => PersistedState::from_document(document),
            None => Ok(None),
        }
    }

    async fn save_state(&self, id: &str, state: &PersistedState) -> Result<(), PersistenceError> {
        let _guard = self.lock.write().await;

        let mut documents = self.read_all().await?;
        let mut patch = serde_json::Map::new();
        patch.insert(id.to_string(), state.to_document());
        merge_documents(&mut documents, Value::Object(patch));

        self.write_all(&documents).await
    }
}
