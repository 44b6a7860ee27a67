//! Export and import of the whole persisted document as JSON.

mod reader;
mod writer;

pub use reader::SettingsReader;
pub use writer::SettingsWriter;

/// File name suggested for exports
pub const EXPORT_FILE_NAME: &str = "history_cleaner_settings.json";
