//! Typed access to the persisted document.
//!
//! The document is a flat set of keys (see [`keys`]). Missing keys read as
//! their defaults. A key holding a value of the wrong shape is reported as
//! [`Error::Decode`] rather than silently replaced.

pub mod keys;
mod types;

pub use types::{
    ClearRange, DEFAULT_LOCK_TIMEOUT_SECS, GlobalSchedule, LockConfig, TrackedSite,
    UNKNOWN_SITE_NAME, lenient_minutes, minutes_from_value, secs_to_ms,
};

use crate::activity::{self, LogEntry};
use crate::host::KeyValueStore;
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn KeyValueStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The underlying store, for whole-document operations
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::Decode {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    async fn write(&self, entries: Vec<(&str, Value)>) -> Result<()> {
        let map: Map<String, Value> = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        self.store.set(map).await
    }

    fn encode<T: Serialize>(value: &T) -> Result<Value> {
        Ok(serde_json::to_value(value)?)
    }

    // Tracked sites

    pub async fn tracked_sites(&self) -> Result<Vec<TrackedSite>> {
        Ok(self.read(keys::URLS).await?.unwrap_or_default())
    }

    pub async fn save_tracked_sites(&self, sites: &[TrackedSite]) -> Result<()> {
        self.write(vec![(keys::URLS, Self::encode(&sites)?)]).await
    }

    // Global schedule

    pub async fn global_schedule(&self) -> Result<GlobalSchedule> {
        let enabled = self
            .read::<bool>(keys::GLOBAL_AUTO_CLEAN)
            .await?
            .unwrap_or(false);
        let interval_minutes = self
            .store
            .get(keys::GLOBAL_INTERVAL)
            .await?
            .as_ref()
            .and_then(minutes_from_value);
        Ok(GlobalSchedule {
            enabled,
            interval_minutes,
        })
    }

    /// Store the global interval; a positive value enables the global schedule
    pub async fn save_global_interval(&self, minutes: Option<u32>) -> Result<GlobalSchedule> {
        let minutes = minutes.filter(|m| *m > 0);
        let text = minutes.map(|m| m.to_string()).unwrap_or_default();
        self.write(vec![
            (keys::GLOBAL_INTERVAL, Value::String(text)),
            (keys::GLOBAL_AUTO_CLEAN, Value::Bool(minutes.is_some())),
        ])
        .await?;
        Ok(GlobalSchedule {
            enabled: minutes.is_some(),
            interval_minutes: minutes,
        })
    }

    // Clear range

    pub async fn clear_range(&self) -> Result<ClearRange> {
        Ok(self.read(keys::CLEAR_RANGE).await?.unwrap_or_default())
    }

    pub async fn save_clear_range(&self, range: ClearRange) -> Result<()> {
        self.write(vec![(keys::CLEAR_RANGE, Self::encode(&range)?)])
            .await
    }

    // Activity log

    pub async fn logs(&self) -> Result<Vec<LogEntry>> {
        Ok(self.read(keys::LOGS).await?.unwrap_or_default())
    }

    /// Append one entry, keeping at most [`activity::LOG_CAPACITY`]
    pub async fn append_log(&self, entry: LogEntry) -> Result<()> {
        let mut logs = self.logs().await?;
        activity::push_capped(&mut logs, entry);
        self.write(vec![(keys::LOGS, Self::encode(&logs)?)]).await
    }

    pub async fn clear_logs(&self) -> Result<()> {
        self.write(vec![(keys::LOGS, Value::Array(Vec::new()))])
            .await
    }

    // Lock state

    pub async fn lock_config(&self) -> Result<LockConfig> {
        Ok(LockConfig {
            password: self.read(keys::PASSWORD).await?,
            password_hint: self.read(keys::PASSWORD_HINT).await?,
            lock_timeout_secs: self
                .read::<u64>(keys::LOCK_TIME)
                .await?
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_LOCK_TIMEOUT_SECS),
            last_open_time: self.read(keys::LAST_OPEN_TIME).await?,
            locked: self.read(keys::LOCKED).await?.unwrap_or(false),
            should_lock: self.read(keys::SHOULD_LOCK).await?.unwrap_or(false),
        })
    }

    pub async fn save_password(&self, password: &str, hint: Option<&str>) -> Result<()> {
        self.write(vec![
            (keys::PASSWORD, Value::String(password.to_string())),
            (
                keys::PASSWORD_HINT,
                hint.map(|h| Value::String(h.to_string()))
                    .unwrap_or(Value::Null),
            ),
        ])
        .await
    }

    pub async fn save_lock_flags(&self, locked: bool, should_lock: bool) -> Result<()> {
        self.write(vec![
            (keys::LOCKED, Value::Bool(locked)),
            (keys::SHOULD_LOCK, Value::Bool(should_lock)),
        ])
        .await
    }

    pub async fn save_locked(&self, locked: bool) -> Result<()> {
        self.write(vec![(keys::LOCKED, Value::Bool(locked))]).await
    }

    pub async fn save_should_lock(&self, should_lock: bool) -> Result<()> {
        self.write(vec![(keys::SHOULD_LOCK, Value::Bool(should_lock))])
            .await
    }

    pub async fn save_last_open_time(&self, at_ms: i64) -> Result<()> {
        self.write(vec![(keys::LAST_OPEN_TIME, Value::from(at_ms))])
            .await
    }

    pub async fn save_lock_timeout(&self, secs: u64) -> Result<()> {
        self.write(vec![(keys::LOCK_TIME, Value::from(secs))]).await
    }

    /// Unlock and restart the idle window in a single write
    pub async fn save_unlocked_at(&self, at_ms: i64) -> Result<()> {
        self.write(vec![
            (keys::LOCKED, Value::Bool(false)),
            (keys::SHOULD_LOCK, Value::Bool(false)),
            (keys::LAST_OPEN_TIME, Value::from(at_ms)),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;

    fn settings_with(document: Value) -> Settings {
        let map = document.as_object().cloned().unwrap_or_default();
        Settings::new(Arc::new(MemoryStore::with_document(map)))
    }

    #[tokio::test]
    async fn test_defaults_for_empty_document() {
        let settings = settings_with(json!({}));
        assert!(settings.tracked_sites().await.unwrap().is_empty());
        assert_eq!(settings.clear_range().await.unwrap(), ClearRange::Hour);
        assert_eq!(
            settings.global_schedule().await.unwrap(),
            GlobalSchedule::default()
        );
        assert!(settings.logs().await.unwrap().is_empty());
        assert_eq!(settings.lock_config().await.unwrap(), LockConfig::default());
    }

    #[tokio::test]
    async fn test_global_interval_is_string_typed() {
        let settings = settings_with(json!({}));
        let schedule = settings.save_global_interval(Some(15)).await.unwrap();
        assert!(schedule.enabled);

        let store = settings.store();
        assert_eq!(
            store.get(keys::GLOBAL_INTERVAL).await.unwrap(),
            Some(json!("15"))
        );
        assert_eq!(
            store.get(keys::GLOBAL_AUTO_CLEAN).await.unwrap(),
            Some(json!(true))
        );

        let schedule = settings.save_global_interval(Some(0)).await.unwrap();
        assert!(!schedule.enabled);
        assert_eq!(
            store.get(keys::GLOBAL_INTERVAL).await.unwrap(),
            Some(json!(""))
        );
        assert_eq!(settings.global_schedule().await.unwrap().effective_period(), None);
    }

    #[tokio::test]
    async fn test_append_log_caps_at_capacity() {
        let settings = settings_with(json!({}));
        for i in 0..105 {
            settings
                .append_log(LogEntry::new("t", format!("entry {}", i)))
                .await
                .unwrap();
        }
        let logs = settings.logs().await.unwrap();
        assert_eq!(logs.len(), activity::LOG_CAPACITY);
        assert!(logs.iter().all(|e| e.message != "entry 4"));
        assert_eq!(logs[0].message, "entry 5");
        assert_eq!(logs[99].message, "entry 104");

        settings.clear_logs().await.unwrap();
        assert!(settings.logs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_value_is_reported() {
        let settings = settings_with(json!({"urls": "not a list", "clearRange": "fortnight"}));
        let err = settings.tracked_sites().await.unwrap_err();
        assert!(matches!(err, Error::Decode { ref key, .. } if key == "urls"));
        assert!(settings.clear_range().await.is_err());
    }

    #[tokio::test]
    async fn test_lock_config_round_trip() {
        let settings = settings_with(json!({"lockTime": 0}));
        assert_eq!(
            settings.lock_config().await.unwrap().lock_timeout_secs,
            DEFAULT_LOCK_TIMEOUT_SECS
        );

        settings.save_password("", Some("empty")).await.unwrap();
        settings.save_lock_flags(true, true).await.unwrap();
        settings.save_lock_timeout(90).await.unwrap();
        settings.save_last_open_time(42).await.unwrap();

        let config = settings.lock_config().await.unwrap();
        assert_eq!(config.password.as_deref(), Some(""));
        assert_eq!(config.password_hint.as_deref(), Some("empty"));
        assert!(config.locked && config.should_lock);
        assert_eq!(config.lock_timeout_secs, 90);
        assert_eq!(config.last_open_time, Some(42));

        settings.save_unlocked_at(100).await.unwrap();
        let config = settings.lock_config().await.unwrap();
        assert!(!config.locked && !config.should_lock);
        assert_eq!(config.last_open_time, Some(100));
    }
}
