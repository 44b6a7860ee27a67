use super::{Context, GlobalOptions, block_on};
use anyhow::Result;
use console::style;
use scrubber_core::transfer::{EXPORT_FILE_NAME, SettingsReader, SettingsWriter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Export every stored setting as one JSON document
///
/// `-` writes to stdout; no output path writes `history_cleaner_settings.json`
/// in the current directory.
pub fn export(options: &GlobalOptions, output: Option<PathBuf>) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let output = output.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
        if output == Path::new("-") {
            let json = SettingsWriter::to_string(&*ctx.store).await?;
            io::stdout().write_all(json.as_bytes())?;
            io::stdout().write_all(b"\n")?;
            return Ok(());
        }

        let keys = SettingsWriter::to_file(&*ctx.store, &output).await?;
        ctx.emit(
            &serde_json::json!({ "path": output.display().to_string(), "keys": keys }),
            || {
                println!(
                    "{} Exported {} setting(s) to {}",
                    style("✓").green(),
                    keys,
                    output.display()
                );
            },
        )
    })
}

/// Merge a previously exported document into storage
pub fn import(options: &GlobalOptions, file: &Path) -> Result<()> {
    tracing::debug!("Importing settings from {}", file.display());
    let document = SettingsReader::from_file(file)?;
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let keys = SettingsReader::import(&*ctx.store, document).await?;
        // stored sites and schedules may have changed
        if let Err(e) = ctx.app.scheduler.reconcile_all_timers().await {
            tracing::warn!("Failed to re-arm alarms after import: {}", e);
        }
        ctx.emit(&serde_json::json!({ "keys": keys }), || {
            println!("{} Imported {} setting(s)", style("✓").green(), keys);
        })
    })
}
