//! The background daemon.
//!
//! Owns the real alarms and the idle lock timer. With `--stdin` it also
//! serves UI messages: one JSON request per line in, one JSON response per
//! line out. Lock notifications are written to stdout the same way.

use super::{GlobalOptions, block_on};
use anyhow::Result;
use scrubber_core::clock::SystemClock;
use scrubber_core::settings::keys;
use scrubber_engine::{App, Background, Collaborators, Request};
use scrubber_host::{ChannelNotifier, JsonFileStore, JsonHistory, TokioAlarms};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// How often the idle lock and the settings file are checked
const TICK: Duration = Duration::from_secs(1);

/// Keys whose change means the alarms must be re-derived
const SCHEDULE_KEYS: [&str; 3] = [keys::URLS, keys::GLOBAL_AUTO_CLEAN, keys::GLOBAL_INTERVAL];

pub fn execute(options: &GlobalOptions, serve_stdin: bool, minute_secs: u64) -> Result<()> {
    block_on(async {
        let data_dir = options.open_data_dir()?;
        let store = Arc::new(JsonFileStore::open(data_dir.storage_path()).await?);
        let (alarms, mut fires) = TokioAlarms::with_minute(Duration::from_secs(minute_secs.max(1)));
        let (notifier, mut notifications) = ChannelNotifier::new();

        let app = App::with_domain_rule(
            Collaborators {
                store: store.clone(),
                history: Arc::new(JsonHistory::new(data_dir.history_path())),
                alarms: Arc::new(alarms),
                notifier: Arc::new(notifier),
                clock: Arc::new(SystemClock),
            },
            options.domain_rule(),
        );

        let state = app.background.startup().await?;
        tracing::info!(
            "Background running from {} ({:?})",
            data_dir.path().display(),
            state
        );

        let mut lines = serve_stdin.then(|| BufReader::new(tokio::io::stdin()).lines());
        let mut tick = tokio::time::interval(TICK);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(fire) = fires.recv() => {
                    app.background.on_alarm(&fire.name).await;
                }
                Some(notification) = notifications.recv() => {
                    println!("{}", serde_json::to_string(&notification)?);
                }
                _ = tick.tick() => {
                    app.background.on_idle_tick().await;
                    reload(&store, &app).await;
                }
                line = next_line(&mut lines) => match line? {
                    Some(line) => serve(&app.background, &line).await?,
                    None => {
                        tracing::debug!("UI channel closed");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    tracing::info!("Shutting down");
                    break;
                }
            }
        }
        Ok(())
    })
}

async fn next_line(lines: &mut Option<Lines<BufReader<Stdin>>>) -> std::io::Result<Option<String>> {
    match lines {
        Some(lines) => lines.next_line().await,
        None => std::future::pending().await,
    }
}

/// Answer one UI message line
async fn serve(background: &Background, line: &str) -> Result<()> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }

    let reply = match serde_json::from_str::<Request>(line) {
        Ok(request) => match background.dispatch(request).await {
            Ok(response) => serde_json::to_value(response)?,
            Err(e) => {
                tracing::warn!("Request failed: {}", e);
                serde_json::json!({ "error": e.to_string() })
            }
        },
        Err(e) => {
            tracing::warn!("Malformed request: {}", e);
            serde_json::json!({ "error": format!("Malformed request: {}", e) })
        }
    };
    println!("{}", serde_json::to_string(&reply)?);
    Ok(())
}

/// Pick up settings written by other invocations
async fn reload(store: &JsonFileStore, app: &App) {
    let changed = match store.reload().await {
        Ok(changed) => changed,
        Err(e) => {
            tracing::warn!("Failed to reload settings: {}", e);
            return;
        }
    };
    if changed.iter().any(|key| SCHEDULE_KEYS.contains(&key.as_str())) {
        tracing::info!("Schedule changed on disk, re-arming alarms");
        if let Err(e) = app.scheduler.reconcile_all_timers().await {
            tracing::warn!("Failed to re-arm alarms: {}", e);
        }
    }
}
