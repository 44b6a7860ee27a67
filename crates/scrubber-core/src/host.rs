//! Capabilities the host environment provides.
//!
//! Storage, browsing history, recurring alarms and the push channel to the
//! UI are all owned by the host. Everything here is asynchronous and every
//! failure is reported as a [`crate::Error`]; nothing blocks.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat persistent key-value document
///
/// Each key is read and written as a whole value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read one key, `None` if it was never written
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write every entry in `entries`, leaving other keys untouched
    async fn set(&self, entries: Map<String, Value>) -> Result<()>;

    /// Delete one key
    async fn remove(&self, key: &str) -> Result<()>;

    /// The whole document
    async fn snapshot(&self) -> Result<Map<String, Value>>;
}

/// A single page in browsing history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Epoch milliseconds of the most recent visit
    pub last_visit_time: i64,
}

/// Search parameters for [`HistoryService::search`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Substring to match in URL or title; empty matches everything
    pub text: String,
    /// Inclusive lower bound, epoch milliseconds
    pub start_time: i64,
    /// Exclusive upper bound, epoch milliseconds; `None` means now
    pub end_time: Option<i64>,
    pub max_results: Option<usize>,
}

impl HistoryQuery {
    /// Every visit within `[start, end)`
    pub fn window(start_time: i64, end_time: i64) -> Self {
        Self {
            text: String::new(),
            start_time,
            end_time: Some(end_time),
            max_results: None,
        }
    }

    /// The most recent `max_results` visits of all time
    pub fn recent(max_results: usize) -> Self {
        Self {
            max_results: Some(max_results),
            ..Self::default()
        }
    }

    /// Check whether an item satisfies this query (ignoring `max_results`)
    pub fn admits(&self, item: &HistoryItem) -> bool {
        if item.last_visit_time < self.start_time {
            return false;
        }
        if let Some(end) = self.end_time {
            if item.last_visit_time >= end {
                return false;
            }
        }
        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        item.url.to_lowercase().contains(&needle)
            || item
                .title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
    }
}

#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn search(&self, query: &HistoryQuery) -> Result<Vec<HistoryItem>>;

    /// Remove every visit to exactly this URL
    async fn delete_url(&self, url: &str) -> Result<()>;
}

/// Prefix shared by every per-site cleanup alarm
pub const ALARM_PREFIX: &str = "clearHistory_";

/// Deterministic alarm name for a tracked site
pub fn alarm_name_for(site_url: &str) -> String {
    format!("{}{}", ALARM_PREFIX, site_url)
}

/// Recover the site URL from an alarm name, if it is a cleanup alarm
pub fn site_for_alarm(alarm_name: &str) -> Option<&str> {
    alarm_name
        .strip_prefix(ALARM_PREFIX)
        .filter(|site| !site.is_empty())
}

/// Recurring named timers
#[async_trait]
pub trait AlarmService: Send + Sync {
    /// Create or replace the alarm `name`, firing every `period_minutes`
    async fn create(&self, name: &str, period_minutes: u32) -> Result<()>;

    /// Cancel the alarm; returns whether one existed
    async fn clear(&self, name: &str) -> Result<bool>;

    /// Names of all active alarms
    async fn names(&self) -> Result<Vec<String>>;
}

/// Push notification from the background to an open UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum UiNotification {
    LockPlugin,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: UiNotification) -> Result<()>;
}
