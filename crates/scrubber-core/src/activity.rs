//! User-visible activity log.
//!
//! Entries are persisted as `"<timestamp>: <message>"` strings, newest last,
//! and the list never grows past [`LOG_CAPACITY`].

use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of entries kept; the oldest are evicted first
pub const LOG_CAPACITY: usize = 100;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

lazy_static! {
    static ref CLEARED_COUNT: Regex = Regex::new(r"(\d+) entries").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            message: message.into(),
        }
    }

    /// Stamp a message with a local time
    pub fn at(time: DateTime<Local>, message: impl Into<String>) -> Self {
        Self::new(time.format(TIMESTAMP_FORMAT).to_string(), message)
    }

    /// Number of history entries this log line reports as cleared
    pub fn cleared_count(&self) -> Option<usize> {
        CLEARED_COUNT
            .captures(&self.message)
            .and_then(|caps| caps[1].parse().ok())
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.timestamp.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.timestamp, self.message)
        }
    }
}

impl From<String> for LogEntry {
    fn from(line: String) -> Self {
        match line.split_once(": ") {
            Some((timestamp, message)) => Self::new(timestamp, message),
            None => Self::new("", line),
        }
    }
}

impl From<LogEntry> for String {
    fn from(entry: LogEntry) -> Self {
        entry.to_string()
    }
}

/// Append an entry, evicting the oldest ones beyond [`LOG_CAPACITY`]
pub fn push_capped(logs: &mut Vec<LogEntry>, entry: LogEntry) {
    logs.push(entry);
    if logs.len() > LOG_CAPACITY {
        let excess = logs.len() - LOG_CAPACITY;
        logs.drain(..excess);
    }
}

/// Total history entries cleared across all log lines
pub fn total_cleared(logs: &[LogEntry]) -> usize {
    logs.iter().filter_map(LogEntry::cleared_count).sum()
}
