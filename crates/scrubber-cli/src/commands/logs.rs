use super::{Context, GlobalOptions, block_on};
use anyhow::Result;
use console::style;

/// Show the activity log, newest last, or wipe it
pub fn execute(options: &GlobalOptions, clear: bool) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        if clear {
            ctx.app.sites.clear_logs().await?;
            return ctx.emit(&serde_json::json!({ "cleared": true }), || {
                println!("{} Activity log cleared", style("✓").green());
            });
        }

        let logs = ctx.app.sites.logs().await?;
        let total = ctx.app.sites.total_cleared().await?;
        ctx.emit(
            &serde_json::json!({ "totalCleared": total, "logs": logs }),
            || {
                println!(
                    "{}",
                    style(format!("Activity log ({} entries cleared)", total)).bold()
                );
                if logs.is_empty() {
                    println!("  {}", style("No activity yet").dim());
                }
                for entry in &logs {
                    println!("  {}  {}", style(&entry.timestamp).dim(), entry.message);
                }
            },
        )
    })
}
