use super::{Context, GlobalOptions, block_on};
use anyhow::Result;
use console::style;
use scrubber_core::settings::ClearRange;

/// Clean every tracked site now
///
/// Without `--range` the stored range is used; a given range is stored for
/// next time.
pub fn execute(options: &GlobalOptions, range: Option<&str>) -> Result<()> {
    let range = range.map(str::parse::<ClearRange>).transpose()?;
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let range = match range {
            Some(range) => range,
            None => ctx.app.sites.clear_range().await?,
        };
        let cleared = ctx.app.sites.clear_now(range).await?;
        // sliding idle window
        ctx.app.lock.check_on_open().await?;

        ctx.emit(
            &serde_json::json!({ "range": range, "cleared": cleared }),
            || {
                println!(
                    "{} Cleared {} history entries ({})",
                    style("✓").green(),
                    style(cleared).bold(),
                    range.label()
                );
            },
        )
    })
}
