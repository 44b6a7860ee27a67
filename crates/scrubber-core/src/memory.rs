use crate::Result;
use crate::host::KeyValueStore;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};

/// Key-value document held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: Arc<Mutex<Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document
    pub fn with_document(document: Map<String, Value>) -> Self {
        Self {
            document: Arc::new(Mutex::new(document)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        // Writes replace whole values, so a poisoned map is still consistent.
        self.document.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<()> {
        self.lock().extend(entries);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    async fn snapshot(&self) -> Result<Map<String, Value>> {
        Ok(self.lock().clone())
    }
}
