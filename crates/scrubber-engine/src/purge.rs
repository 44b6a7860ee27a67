use futures::future::join_all;
use scrubber_core::activity::LogEntry;
use scrubber_core::clock::Clock;
use scrubber_core::domain::{DomainRule, DomainSet};
use scrubber_core::host::{HistoryQuery, HistoryService};
use scrubber_core::settings::{ClearRange, Settings};
use scrubber_core::{Error, Result};
use std::sync::Arc;

/// Who asked for a cleanup; only changes the log prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeMode {
    /// Fired by an alarm or by rescheduling
    Automatic,
    /// "Clear now" from the UI
    Manual,
}

impl PurgeMode {
    pub fn label(&self) -> &'static str {
        match self {
            PurgeMode::Automatic => "Auto clean",
            PurgeMode::Manual => "Manual clean",
        }
    }
}

/// Deletes history entries that belong to tracked domains
pub struct PurgeEngine {
    settings: Settings,
    history: Arc<dyn HistoryService>,
    clock: Arc<dyn Clock>,
    rule: DomainRule,
}

impl PurgeEngine {
    pub fn new(settings: Settings, history: Arc<dyn HistoryService>, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            history,
            clock,
            rule: DomainRule::default(),
        }
    }

    /// Use a different hostname reduction than the two-label default
    pub fn with_domain_rule(mut self, rule: DomainRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn domain_rule(&self) -> DomainRule {
        self.rule
    }

    /// Clean history for every tracked site within `range`
    ///
    /// Returns the number of matched entries. Nothing is logged when nothing
    /// matched. If any deletion fails the error is returned and no log
    /// entry is written, but every deletion is still attempted.
    pub async fn purge(&self, mode: PurgeMode, range: ClearRange) -> Result<usize> {
        let sites = self.settings.tracked_sites().await?;
        let domains = DomainSet::from_urls(self.rule, sites.iter().map(|s| s.url.as_str()));
        self.run(mode, range, &domains).await
    }

    /// Clean history for one site's registrable domain within `range`
    pub async fn purge_site(&self, mode: PurgeMode, site_url: &str, range: ClearRange) -> Result<usize> {
        let mut domains = DomainSet::new(self.rule);
        if !domains.insert_url(site_url) {
            return Err(Error::Validation(format!("Site has no hostname: {}", site_url)));
        }
        self.run(mode, range, &domains).await
    }

    async fn run(&self, mode: PurgeMode, range: ClearRange, domains: &DomainSet) -> Result<usize> {
        if domains.is_empty() {
            tracing::debug!("No tracked domains, nothing to clean");
            return Ok(0);
        }

        let end_time = self.clock.now_ms();
        let start_time = range.start_time(end_time);
        let items = self
            .history
            .search(&HistoryQuery::window(start_time, end_time))
            .await?;

        let matched: Vec<String> = items
            .into_iter()
            .filter(|item| domains.matches_url(&item.url))
            .map(|item| item.url)
            .collect();

        if matched.is_empty() {
            tracing::debug!(
                "No history in {} matched {} tracked domain(s)",
                range.label(),
                domains.len()
            );
            return Ok(0);
        }

        let count = matched.len();
        tracing::debug!("Deleting {} history entries", count);

        let results = join_all(matched.iter().map(|url| self.history.delete_url(url))).await;
        let failures: Vec<(&String, Error)> = matched
            .iter()
            .zip(results)
            .filter_map(|(url, result)| result.err().map(|e| (url, e)))
            .collect();

        if let Some((url, first)) = failures.first() {
            tracing::warn!(
                "{} of {} deletions failed, first on {}: {}",
                failures.len(),
                count,
                url,
                first
            );
            return Err(Error::PurgeIncomplete {
                attempted: count,
                failed: failures.len(),
                first: format!("{}: {}", url, first),
            });
        }

        let message = format!(
            "{}: cleared {} history, {} entries",
            mode.label(),
            range.label(),
            count
        );
        self.settings
            .append_log(LogEntry::at(self.clock.now_local(), message))
            .await?;

        tracing::info!("Cleared {} history entries ({})", count, range.label());
        Ok(count)
    }
}
