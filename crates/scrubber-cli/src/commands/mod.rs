//! Subcommand implementations.
//!
//! Every command opens the data directory, wires an [`App`] against it and
//! runs on a short-lived tokio runtime. Commands that touch the protected
//! surface go through [`Context::ensure_unlocked`] first, the same check the
//! UI makes whenever it opens.

use crate::OutputFormat;
use anyhow::{Result, anyhow};
use scrubber_core::clock::SystemClock;
use scrubber_core::domain::DomainRule;
use scrubber_engine::{App, Collaborators, LockState};
use scrubber_host::{DataDir, JsonFileStore, JsonHistory, MemoryAlarms, TracingNotifier};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

pub mod clear;
pub mod completion;
pub mod history;
pub mod lock;
pub mod logs;
pub mod run;
pub mod schedule;
pub mod site;
pub mod transfer;

/// Options shared by every command
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub data_dir: Option<PathBuf>,
    pub format: OutputFormat,
    pub public_suffix: bool,
}

impl GlobalOptions {
    pub fn domain_rule(&self) -> DomainRule {
        if self.public_suffix {
            DomainRule::PublicSuffix
        } else {
            DomainRule::TwoLabel
        }
    }

    pub fn open_data_dir(&self) -> Result<DataDir> {
        let path = match &self.data_dir {
            Some(path) => path.clone(),
            None => DataDir::default_path()?,
        };
        tracing::debug!("Using data directory {}", path.display());
        Ok(DataDir::persistent(path)?)
    }
}

/// Run `future` to completion on a fresh runtime
pub fn block_on<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}

/// One invocation's view of the data directory
///
/// Alarms created here live only as long as the command; the `run` daemon
/// owns the real timers and picks up stored changes on its own.
pub struct Context {
    pub format: OutputFormat,
    pub data_dir: DataDir,
    pub store: Arc<JsonFileStore>,
    pub history: Arc<JsonHistory>,
    pub app: App,
}

impl Context {
    pub async fn open(options: &GlobalOptions) -> Result<Self> {
        let data_dir = options.open_data_dir()?;
        let store = Arc::new(JsonFileStore::open(data_dir.storage_path()).await?);
        let history = Arc::new(JsonHistory::new(data_dir.history_path()));
        let app = App::with_domain_rule(
            Collaborators {
                store: store.clone(),
                history: history.clone(),
                alarms: Arc::new(MemoryAlarms::new()),
                notifier: Arc::new(TracingNotifier),
                clock: Arc::new(SystemClock),
            },
            options.domain_rule(),
        );

        Ok(Self {
            format: options.format,
            data_dir,
            store,
            history,
            app,
        })
    }

    /// Fail unless the protected surface may be used right now
    pub async fn ensure_unlocked(&self) -> Result<()> {
        match self.app.lock.check_on_open().await? {
            LockState::Locked => Err(anyhow!(
                "scrubber is locked. Run 'scrubber lock unlock' first"
            )),
            LockState::Unlocked | LockState::NoPasswordSet => Ok(()),
        }
    }

    /// Print `value` as JSON when requested, otherwise run `pretty`
    pub fn emit<T: Serialize>(&self, value: &T, pretty: impl FnOnce()) -> Result<()> {
        if self.format.is_json() {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            pretty();
        }
        Ok(())
    }
}
