use super::{Context, GlobalOptions, block_on};
use anyhow::{Result, anyhow};
use console::style;
use scrubber_core::settings::ClearRange;

/// Parse a minute count; `off` and `0` both mean "no schedule"
pub fn parse_minutes(raw: &str) -> Result<Option<u32>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    let minutes: u32 = raw
        .parse()
        .map_err(|_| anyhow!("Invalid interval '{}': expected minutes or 'off'", raw))?;
    Ok((minutes > 0).then_some(minutes))
}

/// Show or set the global cleanup interval
pub fn interval(options: &GlobalOptions, minutes: Option<&str>) -> Result<()> {
    let minutes = minutes.map(parse_minutes).transpose()?;
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let schedule = match minutes {
            Some(minutes) => ctx.app.sites.set_global_interval(minutes).await?,
            None => ctx.app.sites.global_schedule().await?,
        };
        ctx.emit(&schedule, || match schedule.effective_period() {
            Some(minutes) => println!(
                "Global schedule: every {} minute(s), overriding per-site intervals",
                style(minutes).bold()
            ),
            None => println!("Global schedule: {}", style("off").dim()),
        })
    })
}

/// Show or set the lookback range used when cleaning
pub fn range(options: &GlobalOptions, range: Option<&str>) -> Result<()> {
    let range = range.map(str::parse::<ClearRange>).transpose()?;
    block_on(async {
        let ctx = Context::open(options).await?;
        ctx.ensure_unlocked().await?;

        let range = match range {
            Some(range) => {
                ctx.app.sites.set_clear_range(range).await?;
                range
            }
            None => ctx.app.sites.clear_range().await?,
        };
        ctx.emit(&range, || {
            println!("Clear range: {} ({})", style(range).bold(), range.label());
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("15").unwrap(), Some(15));
        assert_eq!(parse_minutes(" 0 ").unwrap(), None);
        assert_eq!(parse_minutes("OFF").unwrap(), None);
        assert!(parse_minutes("-3").is_err());
        assert!(parse_minutes("soon").is_err());
    }
}
