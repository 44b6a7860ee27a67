//! Local browsing history, standing in for the browser's own.

use super::{GlobalOptions, block_on};
use crate::OutputFormat;
use anyhow::{Result, anyhow};
use chrono::{Local, TimeZone};
use console::style;
use scrubber_core::host::{HistoryItem, HistoryQuery, HistoryService};
use scrubber_host::JsonHistory;

fn open(options: &GlobalOptions) -> Result<JsonHistory> {
    let data_dir = options.open_data_dir()?;
    Ok(JsonHistory::new(data_dir.history_path()))
}

fn format_time(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(time) => time.format("%Y/%m/%d %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

/// Record a visit `minutes_ago` minutes in the past
pub fn add(
    options: &GlobalOptions,
    url: &str,
    title: Option<String>,
    minutes_ago: i64,
) -> Result<()> {
    if url.trim().is_empty() {
        return Err(anyhow!("URL must not be empty"));
    }
    let history = open(options)?;
    let item = HistoryItem {
        url: url.trim().to_string(),
        title,
        last_visit_time: Local::now()
            .timestamp_millis()
            .saturating_sub(minutes_ago.saturating_mul(60_000)),
    };
    block_on(async {
        history.add(item.clone()).await?;
        if options.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&item)?);
        } else {
            println!("{} Recorded visit to {}", style("✓").green(), item.url);
        }
        Ok(())
    })
}

/// List visits, newest first
pub fn list(options: &GlobalOptions, text: Option<String>, max: Option<usize>) -> Result<()> {
    let history = open(options)?;
    let query = HistoryQuery {
        text: text.unwrap_or_default(),
        max_results: max,
        ..HistoryQuery::default()
    };
    block_on(async {
        let items = history.search(&query).await?;
        if options.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }
        if items.is_empty() {
            println!("{}", style("History is empty").dim());
        }
        for item in &items {
            println!(
                "  {}  {}  {}",
                style(format_time(item.last_visit_time)).dim(),
                item.url,
                item.title.as_deref().unwrap_or("")
            );
        }
        Ok(())
    })
}
