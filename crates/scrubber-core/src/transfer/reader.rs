use crate::host::KeyValueStore;
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct SettingsReader;

impl SettingsReader {
    /// Read an exported document from the given path
    pub fn from_file(path: &Path) -> Result<Map<String, Value>> {
        tracing::debug!("Reading settings from: {}", path.display());

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let value: Value = serde_json::from_reader(reader)?;

        Self::into_document(value)
    }

    /// Parse an exported document from a JSON string
    pub fn from_str(content: &str) -> Result<Map<String, Value>> {
        let value: Value = serde_json::from_str(content)?;
        Self::into_document(value)
    }

    fn into_document(value: Value) -> Result<Map<String, Value>> {
        match value {
            Value::Object(map) => {
                tracing::info!("Parsed settings document with {} keys", map.len());
                Ok(map)
            }
            other => Err(Error::Validation(format!(
                "Settings file must contain a JSON object, found {}",
                kind_of(&other)
            ))),
        }
    }

    /// Write every key of `document` into the store as-is
    ///
    /// Keys are not checked against the known schema; a malformed value is
    /// only noticed when it is next read.
    pub async fn import(store: &dyn KeyValueStore, document: Map<String, Value>) -> Result<usize> {
        let count = document.len();
        store.set(document).await?;
        tracing::info!("Imported {} settings keys", count);
        Ok(count)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
