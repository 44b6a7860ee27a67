use crate::Result;
use crate::host::KeyValueStore;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub struct SettingsWriter;

impl SettingsWriter {
    /// Write the whole document to a file
    pub async fn to_file(store: &dyn KeyValueStore, path: &Path) -> Result<usize> {
        tracing::debug!("Writing settings to: {}", path.display());

        let document = store.snapshot().await?;
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &document)?;

        tracing::info!(
            "Exported {} settings keys to {}",
            document.len(),
            path.display()
        );

        Ok(document.len())
    }

    /// Convert the whole document to a compact JSON string
    pub async fn to_string(store: &dyn KeyValueStore) -> Result<String> {
        let document = store.snapshot().await?;
        Ok(serde_json::to_string(&document)?)
    }
}
