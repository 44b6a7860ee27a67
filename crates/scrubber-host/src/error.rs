use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data directory error: {0}")]
    DataDir(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt file {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

impl From<Error> for scrubber_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => scrubber_core::Error::Io(e),
            other => scrubber_core::Error::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
