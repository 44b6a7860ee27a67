use crate::{Error, Result};
use std::path::{Path, PathBuf};

const STORAGE_FILE: &str = "storage.json";
const HISTORY_FILE: &str = "history.json";

/// Directory holding the persisted document and the local history file
pub struct DataDir {
    path: PathBuf,
    is_temporary: bool,
}

impl DataDir {
    /// Default location: `~/.scrubber`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::DataDir("Could not determine home directory".to_string()))?;
        Ok(home.join(".scrubber"))
    }

    /// Create a temporary directory that will be deleted on drop
    pub fn temporary() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.keep();

        Ok(Self {
            path,
            is_temporary: true,
        })
    }

    /// Create or use a persistent directory at the given path
    pub fn persistent(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(&path)?;
        }
        if !path.is_dir() {
            return Err(Error::DataDir(format!(
                "{} exists and is not a directory",
                path.display()
            )));
        }

        Ok(Self {
            path,
            is_temporary: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }

    pub fn storage_path(&self) -> PathBuf {
        self.path.join(STORAGE_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.path.join(HISTORY_FILE)
    }
}

impl Drop for DataDir {
    fn drop(&mut self) {
        if self.is_temporary && self.path.exists() {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
