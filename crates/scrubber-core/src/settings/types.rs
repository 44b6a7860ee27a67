use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Name shown for a site whose title could not be found in history
pub const UNKNOWN_SITE_NAME: &str = "Unknown site";

/// Default idle lock timeout, in seconds
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 300;

/// Seconds to milliseconds, clamped to the `i64` range
pub fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX).saturating_mul(1000)
}

/// A site whose history is cleaned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedSite {
    /// Normalized URL; identity of the site
    pub url: String,
    #[serde(default = "unknown_site_name")]
    pub site_name: String,
    #[serde(default)]
    pub scheduled: bool,
    /// Per-site cleanup period in minutes
    #[serde(
        default,
        deserialize_with = "lenient_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub interval: Option<u32>,
}

impl TrackedSite {
    pub fn new(url: impl Into<String>, site_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            site_name: site_name.into(),
            scheduled: false,
            interval: None,
        }
    }

    /// Period of this site's own schedule, if it has an active one
    pub fn own_period(&self) -> Option<u32> {
        if self.scheduled {
            self.interval.filter(|m| *m > 0)
        } else {
            None
        }
    }

    pub fn has_unknown_name(&self) -> bool {
        self.site_name == UNKNOWN_SITE_NAME || self.site_name.is_empty()
    }
}

fn unknown_site_name() -> String {
    UNKNOWN_SITE_NAME.to_string()
}

/// Interpret a stored minute count that may be a number, a numeric string or empty
pub fn minutes_from_value(value: &Value) -> Option<u32> {
    let minutes = match value {
        Value::Number(n) => n.as_u64().and_then(|m| u32::try_from(m).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    minutes.filter(|m| *m > 0)
}

/// Serde adapter for [`minutes_from_value`]
pub fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(minutes_from_value(&value))
}

/// Schedule applied to every tracked site; overrides per-site schedules when enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSchedule {
    pub enabled: bool,
    pub interval_minutes: Option<u32>,
}

impl GlobalSchedule {
    /// Period to use for every site, if the global schedule is in force
    pub fn effective_period(&self) -> Option<u32> {
        if self.enabled {
            self.interval_minutes.filter(|m| *m > 0)
        } else {
            None
        }
    }
}

/// Lookback window applied when searching history to clean
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearRange {
    #[default]
    Hour,
    Day,
    Week,
    All,
}

impl ClearRange {
    pub const ALL: [ClearRange; 4] = [
        ClearRange::Hour,
        ClearRange::Day,
        ClearRange::Week,
        ClearRange::All,
    ];

    /// Width of the window in milliseconds; `None` means all of history
    pub fn window_ms(&self) -> Option<i64> {
        match self {
            ClearRange::Hour => Some(60 * 60 * 1000),
            ClearRange::Day => Some(24 * 60 * 60 * 1000),
            ClearRange::Week => Some(7 * 24 * 60 * 60 * 1000),
            ClearRange::All => None,
        }
    }

    /// Start of the window ending at `now_ms`
    pub fn start_time(&self, now_ms: i64) -> i64 {
        match self.window_ms() {
            Some(window) => now_ms - window,
            None => 0,
        }
    }

    /// Human-readable label used in log messages
    pub fn label(&self) -> &'static str {
        match self {
            ClearRange::Hour => "last hour",
            ClearRange::Day => "last 24 hours",
            ClearRange::Week => "last 7 days",
            ClearRange::All => "all",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClearRange::Hour => "hour",
            ClearRange::Day => "day",
            ClearRange::Week => "week",
            ClearRange::All => "all",
        }
    }
}

impl fmt::Display for ClearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClearRange {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Ok(ClearRange::Hour),
            "day" => Ok(ClearRange::Day),
            "week" => Ok(ClearRange::Week),
            "all" => Ok(ClearRange::All),
            other => Err(crate::Error::Validation(format!(
                "Unknown clear range '{}' (expected hour, day, week or all)",
                other
            ))),
        }
    }
}

/// Persisted lock-screen state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockConfig {
    pub password: Option<String>,
    pub password_hint: Option<String>,
    pub lock_timeout_secs: u64,
    /// Epoch milliseconds of the last UI interaction
    pub last_open_time: Option<i64>,
    pub locked: bool,
    pub should_lock: bool,
}

impl LockConfig {
    /// An empty password still counts as set
    pub fn password_set(&self) -> bool {
        self.password.is_some()
    }

    /// Plain equality; stored passwords are not hashed
    pub fn password_matches(&self, attempt: &str) -> bool {
        match &self.password {
            Some(password) => password == attempt,
            None => true,
        }
    }

    /// Whether the idle window has run out at `now_ms`
    pub fn idle_expired(&self, now_ms: i64) -> bool {
        match self.last_open_time {
            Some(last) => now_ms.saturating_sub(last) >= secs_to_ms(self.lock_timeout_secs),
            None => false,
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            password: None,
            password_hint: None,
            lock_timeout_secs: DEFAULT_LOCK_TIMEOUT_SECS,
            last_open_time: None,
            locked: false,
            should_lock: false,
        }
    }
}
