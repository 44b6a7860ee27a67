use crate::{Error, Result};
use async_trait::async_trait;
use scrubber_core::host::KeyValueStore;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Key-value document persisted as a single JSON file
///
/// Every write re-reads the file, applies its entries on top and rewrites the
/// whole file through a temporary sibling and a rename, so readers never see
/// a half-written document and keys written by other processes survive.
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<State>,
}

struct State {
    document: Map<String, Value>,
    /// Keys other processes changed, picked up by a write before `reload`
    pending: BTreeSet<String>,
}

impl State {
    /// Adopt `fresh` as the document, remembering which keys differed
    fn absorb(&mut self, fresh: Map<String, Value>) {
        let changed = diff_keys(&self.document, &fresh);
        self.pending.extend(changed);
        self.document = fresh;
    }
}

fn diff_keys(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<String> {
    let mut changed: Vec<String> = new
        .iter()
        .filter(|(key, value)| old.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    changed.extend(old.keys().filter(|key| !new.contains_key(*key)).cloned());
    changed
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = Self::load(&path).await?;
        tracing::debug!(
            "Opened settings store {} ({} keys)",
            path.display(),
            document.len()
        );
        Ok(Self {
            path,
            state: Mutex::new(State {
                document,
                pending: BTreeSet::new(),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, picking up writes made by other processes
    ///
    /// Returns the keys whose values changed, were added or were removed.
    /// Keys changed by outside writes that this store's own writes already
    /// merged in are reported here too.
    pub async fn reload(&self) -> Result<Vec<String>> {
        let mut state = self.state.lock().await;
        let fresh = Self::load(&self.path).await?;
        state.absorb(fresh);
        let changed: Vec<String> = std::mem::take(&mut state.pending).into_iter().collect();
        if !changed.is_empty() {
            tracing::debug!("Reloaded settings store, {} key(s) changed", changed.len());
        }
        Ok(changed)
    }

    async fn load(path: &Path) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::Corrupt {
                path: path.display().to_string(),
                reason: "top-level value is not an object".to_string(),
            }),
            Err(e) => Err(Error::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn persist(&self, document: &Map<String, Value>) -> Result<()> {
        let json = serde_json::to_vec_pretty(document).map_err(|e| Error::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> scrubber_core::Result<Option<Value>> {
        Ok(self.state.lock().await.document.get(key).cloned())
    }

    async fn set(&self, entries: Map<String, Value>) -> scrubber_core::Result<()> {
        let mut state = self.state.lock().await;
        let fresh = Self::load(&self.path).await?;
        state.absorb(fresh);
        let mut updated = state.document.clone();
        updated.extend(entries);
        self.persist(&updated).await?;
        state.document = updated;
        Ok(())
    }

    async fn remove(&self, key: &str) -> scrubber_core::Result<()> {
        let mut state = self.state.lock().await;
        let fresh = Self::load(&self.path).await?;
        state.absorb(fresh);
        if !state.document.contains_key(key) {
            return Ok(());
        }
        let mut updated = state.document.clone();
        updated.remove(key);
        self.persist(&updated).await?;
        state.document = updated;
        Ok(())
    }

    async fn snapshot(&self) -> scrubber_core::Result<Map<String, Value>> {
        Ok(self.state.lock().await.document.clone())
    }
}
