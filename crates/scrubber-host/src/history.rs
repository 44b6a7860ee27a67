use crate::Error;
use async_trait::async_trait;
use scrubber_core::host::{HistoryItem, HistoryQuery, HistoryService};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Apply a query to a list of items: newest first, truncated to `max_results`
fn run_query(items: &[HistoryItem], query: &HistoryQuery) -> Vec<HistoryItem> {
    let mut matched: Vec<HistoryItem> = items
        .iter()
        .filter(|item| query.admits(item))
        .cloned()
        .collect();
    matched.sort_by(|a, b| b.last_visit_time.cmp(&a.last_visit_time));
    if let Some(max) = query.max_results {
        matched.truncate(max);
    }
    matched
}

#[derive(Debug, Default)]
struct MemoryHistoryInner {
    items: Vec<HistoryItem>,
    failing: HashSet<String>,
    deleted: Vec<String>,
}

/// In-process history with injectable delete failures
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    inner: Arc<Mutex<MemoryHistoryInner>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<HistoryItem>) -> Self {
        let history = Self::new();
        history.lock().items = items;
        history
    }

    fn lock(&self) -> MutexGuard<'_, MemoryHistoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add(&self, url: &str, title: Option<&str>, at_ms: i64) {
        self.lock().items.push(HistoryItem {
            url: url.to_string(),
            title: title.map(str::to_string),
            last_visit_time: at_ms,
        });
    }

    /// Make every later `delete_url(url)` fail
    pub fn fail_deletes_for(&self, url: &str) {
        self.lock().failing.insert(url.to_string());
    }

    /// URLs passed to `delete_url`, in call order, including failed ones
    pub fn delete_calls(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.lock().items.iter().map(|i| i.url.clone()).collect()
    }
}

#[async_trait]
impl HistoryService for MemoryHistory {
    async fn search(&self, query: &HistoryQuery) -> scrubber_core::Result<Vec<HistoryItem>> {
        Ok(run_query(&self.lock().items, query))
    }

    async fn delete_url(&self, url: &str) -> scrubber_core::Result<()> {
        let mut inner = self.lock();
        inner.deleted.push(url.to_string());
        if inner.failing.contains(url) {
            return Err(scrubber_core::Error::History(format!(
                "Failed to delete {}",
                url
            )));
        }
        inner.items.retain(|item| item.url != url);
        Ok(())
    }
}

/// History kept in a JSON file of [`HistoryItem`]s
pub struct JsonHistory {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl JsonHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> crate::Result<Vec<HistoryItem>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| Error::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    async fn save(&self, items: &[HistoryItem]) -> crate::Result<()> {
        let json = serde_json::to_vec_pretty(items).map_err(|e| Error::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Record a visit
    pub async fn add(&self, item: HistoryItem) -> scrubber_core::Result<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        items.push(item);
        self.save(&items).await?;
        Ok(())
    }

    pub async fn all(&self) -> scrubber_core::Result<Vec<HistoryItem>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?)
    }
}

#[async_trait]
impl HistoryService for JsonHistory {
    async fn search(&self, query: &HistoryQuery) -> scrubber_core::Result<Vec<HistoryItem>> {
        let _guard = self.lock.lock().await;
        let items = self.load().await?;
        Ok(run_query(&items, query))
    }

    async fn delete_url(&self, url: &str) -> scrubber_core::Result<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        let before = items.len();
        items.retain(|item| item.url != url);
        if items.len() != before {
            self.save(&items).await?;
        }
        tracing::debug!("Deleted {} visits to {}", before - items.len(), url);
        Ok(())
    }
}
