//! Tracked site management.
//!
//! ```bash
//! scrubber site add example.com
//! scrubber site schedule 1 --every 30
//! scrubber site rename https://example.com/ "Example"
//! scrubber site remove 1
//! ```

use super::{Context, GlobalOptions, block_on};
use anyhow::Result;
use console::style;
use scrubber_core::settings::{GlobalSchedule, TrackedSite};
use scrubber_engine::SiteRef;

/// Track a new site
pub fn add(options: &GlobalOptions, url: &str) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let site = ctx.app.sites.add_site(url).await?;
        ctx.emit(&site, || {
            println!(
                "{} Tracking {} ({})",
                style("✓").green(),
                style(&site.url).bold(),
                site.site_name
            );
        })
    })
}

/// Stop tracking a site
pub fn remove(options: &GlobalOptions, target: &str) -> Result<()> {
    let target: SiteRef = target.parse()?;
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let site = ctx.app.sites.remove_site(&target).await?;
        ctx.emit(&site, || {
            println!("{} Removed {}", style("✓").green(), style(&site.url).bold());
        })
    })
}

/// List tracked sites with their schedules
pub fn list(options: &GlobalOptions) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let sites = ctx.app.sites.list_sites().await?;
        let global = ctx.app.sites.global_schedule().await?;
        ctx.emit(&sites, || print_sites(&sites, &global))
    })
}

fn print_sites(sites: &[TrackedSite], global: &GlobalSchedule) {
    if sites.is_empty() {
        println!("No sites tracked. Add one with 'scrubber site add <URL>'.");
        return;
    }

    println!("{}", style("Tracked sites:").bold());
    for (i, site) in sites.iter().enumerate() {
        let schedule = match (global.effective_period(), site.own_period()) {
            (Some(minutes), _) => format!("every {} min (global)", minutes),
            (None, Some(minutes)) => format!("every {} min", minutes),
            (None, None) => "manual".to_string(),
        };
        println!(
            "  {:>2}. {:<24} {:<40} {}",
            i + 1,
            site.site_name,
            site.url,
            style(schedule).dim()
        );
    }
}

/// Set or re-resolve a site's display name
pub fn rename(options: &GlobalOptions, target: &str, name: Option<&str>) -> Result<()> {
    let target: SiteRef = target.parse()?;
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let site = ctx.app.sites.rename_site(&target, name).await?;
        ctx.emit(&site, || {
            println!(
                "{} {} is now named {}",
                style("✓").green(),
                site.url,
                style(&site.site_name).bold()
            );
        })
    })
}

/// Re-resolve every site still named "Unknown site"
pub fn refresh(options: &GlobalOptions) -> Result<()> {
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let updated = ctx.app.sites.refresh_unknown_names().await?;
        ctx.emit(&serde_json::json!({ "updated": updated }), || {
            println!("Updated {} site name(s)", updated);
        })
    })
}

/// Turn a site's own schedule on (`Some(minutes)`) or off
pub fn schedule(options: &GlobalOptions, target: &str, minutes: Option<u32>) -> Result<()> {
    let target: SiteRef = target.parse()?;
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let period = ctx.app.sites.schedule_site(&target, minutes).await?;
        ctx.emit(&serde_json::json!({ "site": target.to_string(), "period": period }), || {
            match period {
                Some(minutes) => println!(
                    "{} {} is cleaned every {} minute(s)",
                    style("✓").green(),
                    target,
                    minutes
                ),
                None => println!("{} {} is no longer scheduled", style("✓").green(), target),
            }
        })
    })
}
