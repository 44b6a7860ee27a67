use crate::purge::{PurgeEngine, PurgeMode};
use scrubber_core::Result;
use scrubber_core::clock::Clock;
use scrubber_core::host::{AlarmService, alarm_name_for, site_for_alarm};
use scrubber_core::settings::{ClearRange, Settings};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Alarm fires for a site within this window of its last cleanup are dropped
pub const FIRE_DEBOUNCE_MS: i64 = 60_000;

/// What a reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Site URL to period in minutes, for every alarm that should be active
    pub armed: BTreeMap<String, u32>,
    /// Alarm names that were cancelled
    pub cancelled: Vec<String>,
    /// History entries removed by the immediate cleanups
    pub purged: usize,
}

/// Keeps one recurring alarm per scheduled site in line with the stored settings
pub struct Scheduler {
    settings: Settings,
    alarms: Arc<dyn AlarmService>,
    engine: Arc<PurgeEngine>,
    clock: Arc<dyn Clock>,
    /// Site URL to epoch ms of its last cleanup; lost on restart
    last_purge: Mutex<HashMap<String, i64>>,
}

impl Scheduler {
    pub fn new(
        settings: Settings,
        alarms: Arc<dyn AlarmService>,
        engine: Arc<PurgeEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            alarms,
            engine,
            clock,
            last_purge: Mutex::new(HashMap::new()),
        }
    }

    /// Re-derive every alarm from the stored sites and global schedule
    ///
    /// Each armed site is also cleaned immediately. Alarm failures are logged
    /// and skipped; running this again converges on the same alarm set.
    pub async fn reconcile_all_timers(&self) -> Result<ReconcileReport> {
        let sites = self.settings.tracked_sites().await?;
        let global = self.settings.global_schedule().await?;
        let range = self.settings.clear_range().await?;
        let mut report = ReconcileReport::default();

        for site in &sites {
            let name = alarm_name_for(&site.url);
            match global.effective_period().or(site.own_period()) {
                Some(period) => {
                    self.arm(&name, period).await;
                    report.armed.insert(site.url.clone(), period);
                    report.purged += self.purge_now(&site.url, range).await;
                }
                None => {
                    if self.cancel(&name).await {
                        report.cancelled.push(name);
                    }
                }
            }
        }

        let tracked: BTreeSet<&str> = sites.iter().map(|s| s.url.as_str()).collect();
        self.last_purge
            .lock()
            .await
            .retain(|url, _| tracked.contains(url.as_str()));
        match self.alarms.names().await {
            Ok(names) => {
                for name in names {
                    let orphaned = site_for_alarm(&name).is_some_and(|url| !tracked.contains(url));
                    if orphaned && self.cancel(&name).await {
                        report.cancelled.push(name);
                    }
                }
            }
            Err(e) => tracing::warn!("Failed to list alarms: {}", e),
        }

        tracing::debug!(
            "Reconciled alarms: {} armed, {} cancelled",
            report.armed.len(),
            report.cancelled.len()
        );
        Ok(report)
    }

    /// Handle an alarm going off
    ///
    /// Returns the number of entries cleaned, or `None` if the fire was
    /// ignored (not a cleanup alarm, duplicate delivery, or site no longer
    /// tracked).
    pub async fn on_timer_fire(&self, alarm_name: &str) -> Result<Option<usize>> {
        let Some(site_url) = site_for_alarm(alarm_name) else {
            tracing::debug!("Ignoring unrelated alarm {}", alarm_name);
            return Ok(None);
        };

        let now = self.clock.now_ms();
        {
            let mut last_purge = self.last_purge.lock().await;
            if let Some(last) = last_purge.get(site_url) {
                if now.saturating_sub(*last) < FIRE_DEBOUNCE_MS {
                    tracing::debug!("Dropping duplicate alarm fire for {}", site_url);
                    return Ok(None);
                }
            }

            let sites = self.settings.tracked_sites().await?;
            if !sites.iter().any(|s| s.url == site_url) {
                last_purge.remove(site_url);
                drop(last_purge);
                tracing::info!("Alarm for untracked site {}, cancelling", site_url);
                self.cancel(alarm_name).await;
                return Ok(None);
            }
            last_purge.insert(site_url.to_string(), now);
        }

        let range = self.settings.clear_range().await?;
        let count = self
            .engine
            .purge_site(PurgeMode::Automatic, site_url, range)
            .await?;
        Ok(Some(count))
    }

    /// Store a site's own schedule and arm or cancel its alarm to match
    ///
    /// A site that is not tracked only has its alarm adjusted. An enabled
    /// global schedule keeps the alarm armed at the global period.
    pub async fn set_site_schedule(
        &self,
        url: &str,
        scheduled: bool,
        interval: Option<u32>,
    ) -> Result<Option<u32>> {
        let interval = interval.filter(|m| *m > 0);
        let mut sites = self.settings.tracked_sites().await?;
        if let Some(site) = sites.iter_mut().find(|s| s.url == url) {
            if site.scheduled != scheduled || site.interval != interval {
                site.scheduled = scheduled;
                site.interval = interval;
                self.settings.save_tracked_sites(&sites).await?;
            }
        }

        let global = self.settings.global_schedule().await?;
        let own = if scheduled { interval } else { None };
        let name = alarm_name_for(url);
        let period = global.effective_period().or(own);
        match period {
            Some(period) => self.arm(&name, period).await,
            None => {
                self.cancel(&name).await;
            }
        }
        Ok(period)
    }

    async fn arm(&self, name: &str, period: u32) {
        match self.alarms.create(name, period).await {
            Ok(()) => tracing::info!("Alarm {} set to every {} minute(s)", name, period),
            Err(e) => tracing::warn!("Failed to create alarm {}: {}", name, e),
        }
    }

    async fn cancel(&self, name: &str) -> bool {
        match self.alarms.clear(name).await {
            Ok(existed) => {
                if existed {
                    tracing::info!("Alarm {} cleared", name);
                }
                existed
            }
            Err(e) => {
                tracing::warn!("Failed to clear alarm {}: {}", name, e);
                false
            }
        }
    }

    async fn purge_now(&self, site_url: &str, range: ClearRange) -> usize {
        self.last_purge
            .lock()
            .await
            .insert(site_url.to_string(), self.clock.now_ms());
        match self
            .engine
            .purge_site(PurgeMode::Automatic, site_url, range)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Immediate cleanup for {} failed: {}", site_url, e);
                0
            }
        }
    }
}
