use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{merge_documents, PersistedState, PersistenceError, StateStore};

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw document for `id`, including fields this program never writes.
    #[cfg(test)]
    pub fn document(&self, id: &str) -> Option<Value> {
        self.lock().get(id).cloned()
    }

    #[cfg(test)]
    pub fn insert_document(&self, id: &str, document: Value) {
        self.lock().insert(id.to_string(), document);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        // A panic while holding the lock cannot leave a map half-written.
        self.documents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStore {
    async fn load_state(&self, id: &str) -> Result<Option<PersistedState>, PersistenceError> {
        match self.lock().get(id) {
            Some(document) => PersistedState::from_document(document),
            None => Ok(None),
        }
    }

    async fn save_state(&self, id: &str, state: &PersistedState) -> Result<(), PersistenceError> {
        let mut documents = self.lock();
        let document = documents
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        merge_documents(document, state.to_document());
        Ok(())
    }
}
