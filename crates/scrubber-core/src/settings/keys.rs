//! Names of the keys in the persisted document.

pub const URLS: &str = "urls";
pub const GLOBAL_AUTO_CLEAN: &str = "globalAutoClean";
pub const GLOBAL_INTERVAL: &str = "globalInterval";
pub const CLEAR_RANGE: &str = "clearRange";
pub const LOGS: &str = "logs";
pub const PASSWORD: &str = "password";
pub const PASSWORD_HINT: &str = "passwordHint";
pub const LOCKED: &str = "locked";
pub const SHOULD_LOCK: &str = "shouldLock";
/// Idle lock timeout, in seconds
pub const LOCK_TIME: &str = "lockTime";
/// Epoch milliseconds of the last UI interaction
pub const LAST_OPEN_TIME: &str = "lastOpenTime";
