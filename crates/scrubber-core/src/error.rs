use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read or write file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Stored value for '{key}' is malformed: {reason}")]
    Decode { key: String, reason: String },

    #[error("History error: {0}")]
    History(String),

    #[error("Alarm error: {0}")]
    Alarm(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Site already tracked: {0}")]
    DuplicateSite(String),

    #[error("Site not tracked: {0}")]
    SiteNotFound(String),

    #[error("Incorrect password")]
    PasswordMismatch,

    #[error("No password has been set")]
    NoPassword,

    #[error("A password is already set; change it instead")]
    PasswordAlreadySet,

    #[error("Cleanup incomplete: {failed} of {attempted} deletions failed (first error: {first})")]
    PurgeIncomplete {
        attempted: usize,
        failed: usize,
        first: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
