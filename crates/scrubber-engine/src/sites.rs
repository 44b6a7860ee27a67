use crate::purge::{PurgeEngine, PurgeMode};
use crate::scheduler::Scheduler;
use scrubber_core::activity::{self, LogEntry};
use scrubber_core::domain::host_of;
use scrubber_core::host::{HistoryQuery, HistoryService};
use scrubber_core::settings::{ClearRange, GlobalSchedule, Settings, TrackedSite, UNKNOWN_SITE_NAME};
use scrubber_core::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// How many recent history items are scanned when looking up a site's title
pub const SITE_NAME_SCAN_LIMIT: usize = 5000;

/// A tracked site addressed by URL or by its 1-based position in the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteRef {
    Url(String),
    Index(usize),
}

impl FromStr for SiteRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::Validation("Please enter a URL".to_string()));
        }
        match s.parse::<usize>() {
            Ok(0) => Err(Error::Validation("Site positions start at 1".to_string())),
            Ok(index) => Ok(SiteRef::Index(index)),
            Err(_) => Ok(SiteRef::Url(s.to_string())),
        }
    }
}

impl fmt::Display for SiteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteRef::Url(url) => f.write_str(url),
            SiteRef::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// Normalize user input into a site URL
///
/// Adds `https://` when no scheme is given; the host comes back lowercase.
pub fn normalize_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Validation("Please enter a URL".to_string()));
    }

    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| Error::Validation(format!("'{}' is not a valid URL: {}", raw, e)))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::Validation(format!("'{}' has no hostname", raw)));
    }
    Ok(url.to_string())
}

/// UI-side editing of tracked sites, schedules and the activity log
pub struct SiteManager {
    settings: Settings,
    history: Arc<dyn HistoryService>,
    engine: Arc<PurgeEngine>,
    scheduler: Arc<Scheduler>,
}

impl SiteManager {
    pub fn new(
        settings: Settings,
        history: Arc<dyn HistoryService>,
        engine: Arc<PurgeEngine>,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        Self {
            settings,
            history,
            engine,
            scheduler,
        }
    }

    /// Tracked sites in insertion order, without repeated URLs
    pub async fn list_sites(&self) -> Result<Vec<TrackedSite>> {
        let sites = self.settings.tracked_sites().await?;
        let mut seen = HashSet::new();
        Ok(sites
            .into_iter()
            .filter(|site| seen.insert(site.url.clone()))
            .collect())
    }

    /// Start tracking a site
    ///
    /// Rejects empty input and any site whose registrable domain is already
    /// tracked. The name is looked up from history.
    pub async fn add_site(&self, raw: &str) -> Result<TrackedSite> {
        let url = normalize_url(raw)?;
        let host = host_of(&url)
            .ok_or_else(|| Error::Validation(format!("'{}' has no hostname", raw)))?;
        let rule = self.engine.domain_rule();
        let domain = rule.reduce(&host);

        let mut sites = self.settings.tracked_sites().await?;
        if let Some(existing) = sites
            .iter()
            .find(|s| host_of(&s.url).is_some_and(|h| rule.reduce(&h) == domain))
        {
            return Err(Error::DuplicateSite(existing.url.clone()));
        }

        let site_name = self.lookup_site_name(&host).await;
        let site = TrackedSite::new(url, site_name);
        sites.push(site.clone());
        self.settings.save_tracked_sites(&sites).await?;
        tracing::info!("Tracking {} ({})", site.url, site.site_name);

        self.reschedule().await;
        Ok(site)
    }

    pub async fn remove_site(&self, target: &SiteRef) -> Result<TrackedSite> {
        let mut sites = self.settings.tracked_sites().await?;
        let position = self.position_of(&sites, target)?;
        let removed = sites.remove(position);
        self.settings.save_tracked_sites(&sites).await?;
        tracing::info!("Stopped tracking {}", removed.url);

        self.reschedule().await;
        Ok(removed)
    }

    /// Set a site's display name, or look it up again from history
    pub async fn rename_site(&self, target: &SiteRef, name: Option<&str>) -> Result<TrackedSite> {
        let mut sites = self.settings.tracked_sites().await?;
        let position = self.position_of(&sites, target)?;

        let new_name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => {
                let host = host_of(&sites[position].url).unwrap_or_default();
                self.lookup_site_name(&host).await
            }
        };
        sites[position].site_name = new_name;
        self.settings.save_tracked_sites(&sites).await?;
        Ok(sites[position].clone())
    }

    /// Look up names for every site still called [`UNKNOWN_SITE_NAME`]
    pub async fn refresh_unknown_names(&self) -> Result<usize> {
        let mut sites = self.settings.tracked_sites().await?;
        let mut updated = 0;
        for site in sites.iter_mut().filter(|s| s.has_unknown_name()) {
            let host = host_of(&site.url).unwrap_or_default();
            let name = self.lookup_site_name(&host).await;
            if name != site.site_name {
                site.site_name = name;
                updated += 1;
            }
        }
        if updated > 0 {
            self.settings.save_tracked_sites(&sites).await?;
        }
        Ok(updated)
    }

    /// Set or clear one site's own cleanup period
    pub async fn schedule_site(&self, target: &SiteRef, minutes: Option<u32>) -> Result<Option<u32>> {
        let sites = self.settings.tracked_sites().await?;
        let position = self.position_of(&sites, target)?;
        let url = sites[position].url.clone();
        self.scheduler
            .set_site_schedule(&url, minutes.is_some_and(|m| m > 0), minutes)
            .await
    }

    /// Set the global period; zero or `None` turns the global schedule off
    pub async fn set_global_interval(&self, minutes: Option<u32>) -> Result<GlobalSchedule> {
        let schedule = self.settings.save_global_interval(minutes).await?;
        self.reschedule().await;
        Ok(schedule)
    }

    pub async fn global_schedule(&self) -> Result<GlobalSchedule> {
        self.settings.global_schedule().await
    }

    pub async fn set_clear_range(&self, range: ClearRange) -> Result<()> {
        self.settings.save_clear_range(range).await?;
        tracing::info!("Clear range set to {}", range.label());
        Ok(())
    }

    pub async fn clear_range(&self) -> Result<ClearRange> {
        self.settings.clear_range().await
    }

    /// Clean every tracked site now, remembering `range` as the new default
    pub async fn clear_now(&self, range: ClearRange) -> Result<usize> {
        self.settings.save_clear_range(range).await?;
        if let Err(e) = self.refresh_unknown_names().await {
            tracing::warn!("Failed to refresh site names: {}", e);
        }
        self.engine.purge(PurgeMode::Manual, range).await
    }

    pub async fn logs(&self) -> Result<Vec<LogEntry>> {
        self.settings.logs().await
    }

    pub async fn clear_logs(&self) -> Result<()> {
        self.settings.clear_logs().await
    }

    /// Sum of cleared entries reported across the activity log
    pub async fn total_cleared(&self) -> Result<usize> {
        Ok(activity::total_cleared(&self.settings.logs().await?))
    }

    fn position_of(&self, sites: &[TrackedSite], target: &SiteRef) -> Result<usize> {
        match target {
            SiteRef::Index(index) => {
                if *index >= 1 && *index <= sites.len() {
                    Ok(index - 1)
                } else {
                    Err(Error::SiteNotFound(target.to_string()))
                }
            }
            SiteRef::Url(raw) => {
                let normalized = normalize_url(raw).ok();
                sites
                    .iter()
                    .position(|s| s.url == *raw || Some(&s.url) == normalized.as_ref())
                    .ok_or_else(|| Error::SiteNotFound(raw.clone()))
            }
        }
    }

    async fn lookup_site_name(&self, host: &str) -> String {
        if host.is_empty() {
            return UNKNOWN_SITE_NAME.to_string();
        }
        let items = match self
            .history
            .search(&HistoryQuery::recent(SITE_NAME_SCAN_LIMIT))
            .await
        {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("History lookup for {} failed: {}", host, e);
                return UNKNOWN_SITE_NAME.to_string();
            }
        };

        items
            .into_iter()
            .find(|item| item.url.contains(host))
            .and_then(|item| item.title)
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SITE_NAME.to_string())
    }

    async fn reschedule(&self) {
        if let Err(e) = self.scheduler.reconcile_all_timers().await {
            tracing::warn!("Failed to reschedule alarms: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrubber_core::clock::ManualClock;
    use scrubber_core::domain::DomainRule;
    use scrubber_core::memory::MemoryStore;
    use scrubber_host::{MemoryAlarms, MemoryHistory};

    const NOW: i64 = 1_700_000_000_000;

    struct Fixture {
        sites: SiteManager,
        settings: Settings,
        history: MemoryHistory,
        alarms: MemoryAlarms,
    }

    fn fixture() -> Fixture {
        fixture_with_rule(DomainRule::TwoLabel)
    }

    fn fixture_with_rule(rule: DomainRule) -> Fixture {
        let settings = Settings::new(Arc::new(MemoryStore::new()));
        let history = MemoryHistory::new();
        let alarms = MemoryAlarms::new();
        let clock = Arc::new(ManualClock::new(NOW));
        let engine = Arc::new(
            PurgeEngine::new(settings.clone(), Arc::new(history.clone()), clock.clone())
                .with_domain_rule(rule),
        );
        let scheduler = Arc::new(Scheduler::new(
            settings.clone(),
            Arc::new(alarms.clone()),
            engine.clone(),
            clock,
        ));
        let sites = SiteManager::new(
            settings.clone(),
            Arc::new(history.clone()),
            engine,
            scheduler,
        );
        Fixture {
            sites,
            settings,
            history,
            alarms,
        }
    }

    #[tokio::test]
    async fn test_duplicate_check_follows_domain_rule() {
        let f = fixture();
        f.sites.add_site("a.co.uk").await.unwrap();
        assert!(matches!(
            f.sites.add_site("b.co.uk").await,
            Err(Error::DuplicateSite(_))
        ));

        let f = fixture_with_rule(DomainRule::PublicSuffix);
        f.sites.add_site("a.co.uk").await.unwrap();
        f.sites.add_site("b.co.uk").await.unwrap();
        assert!(matches!(
            f.sites.add_site("shop.a.co.uk").await,
            Err(Error::DuplicateSite(_))
        ));
        assert_eq!(f.sites.list_sites().await.unwrap().len(), 2);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("Example.COM").unwrap(), "https://example.com/");
        assert_eq!(
            normalize_url("  http://news.example.org/path ").unwrap(),
            "http://news.example.org/path"
        );
        assert!(matches!(normalize_url("   "), Err(Error::Validation(_))));
        assert!(normalize_url("https://").is_err());
    }

    #[test]
    fn test_site_ref_parse() {
        assert_eq!("2".parse::<SiteRef>().unwrap(), SiteRef::Index(2));
        assert_eq!(
            "example.com".parse::<SiteRef>().unwrap(),
            SiteRef::Url("example.com".to_string())
        );
        assert!("0".parse::<SiteRef>().is_err());
        assert!("".parse::<SiteRef>().is_err());
    }

    #[tokio::test]
    async fn test_add_site_names_it_from_history() {
        let f = fixture();
        f.history.add("https://www.rust-lang.org/learn", Some("Learn Rust"), NOW - 5);

        let site = f.sites.add_site("www.rust-lang.org").await.unwrap();
        assert_eq!(site.url, "https://www.rust-lang.org/");
        assert_eq!(site.site_name, "Learn Rust");
        assert!(!site.scheduled);

        let unknown = f.sites.add_site("https://example.com").await.unwrap();
        assert_eq!(unknown.site_name, UNKNOWN_SITE_NAME);
        assert_eq!(f.sites.list_sites().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_empty_and_duplicates_without_mutation() {
        let f = fixture();
        assert!(matches!(f.sites.add_site("").await, Err(Error::Validation(_))));

        f.sites.add_site("https://example.com").await.unwrap();
        let before = f.settings.tracked_sites().await.unwrap();

        assert!(matches!(
            f.sites.add_site("EXAMPLE.com").await,
            Err(Error::DuplicateSite(_))
        ));
        assert!(matches!(
            f.sites.add_site("https://mail.example.com/inbox").await,
            Err(Error::DuplicateSite(_))
        ));
        assert_eq!(f.settings.tracked_sites().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_add_site_under_global_schedule_arms_alarm() {
        let f = fixture();
        f.sites.set_global_interval(Some(20)).await.unwrap();
        f.sites.add_site("example.com").await.unwrap();

        assert_eq!(
            f.alarms.active().get("clearHistory_https://example.com/"),
            Some(&20)
        );
    }

    #[tokio::test]
    async fn test_remove_by_index_or_url_cancels_alarm() {
        let f = fixture();
        f.sites.add_site("a.com").await.unwrap();
        f.sites.add_site("b.com").await.unwrap();
        f.sites
            .schedule_site(&SiteRef::Url("b.com".to_string()), Some(5))
            .await
            .unwrap();
        assert_eq!(f.alarms.active().len(), 1);

        let removed = f.sites.remove_site(&SiteRef::Index(2)).await.unwrap();
        assert_eq!(removed.url, "https://b.com/");
        assert!(f.alarms.active().is_empty());

        let removed = f
            .sites
            .remove_site(&SiteRef::Url("https://a.com/".to_string()))
            .await
            .unwrap();
        assert_eq!(removed.url, "https://a.com/");
        assert!(matches!(
            f.sites.remove_site(&SiteRef::Index(1)).await,
            Err(Error::SiteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rename_and_refresh_names() {
        let f = fixture();
        f.sites.add_site("example.com").await.unwrap();

        let renamed = f
            .sites
            .rename_site(&SiteRef::Index(1), Some("My Site"))
            .await
            .unwrap();
        assert_eq!(renamed.site_name, "My Site");

        f.sites
            .rename_site(&SiteRef::Index(1), Some(UNKNOWN_SITE_NAME))
            .await
            .unwrap();
        f.history.add("https://example.com/home", Some("Example Home"), NOW - 1);
        assert_eq!(f.sites.refresh_unknown_names().await.unwrap(), 1);
        assert_eq!(
            f.sites.list_sites().await.unwrap()[0].site_name,
            "Example Home"
        );
    }

    #[tokio::test]
    async fn test_clear_now_saves_range_and_logs_manual_clean() {
        let f = fixture();
        f.sites.add_site("example.com").await.unwrap();
        f.history.add("https://example.com/a", Some("A"), NOW - 2 * 60 * 60 * 1000);

        let count = f.sites.clear_now(ClearRange::Day).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(f.sites.clear_range().await.unwrap(), ClearRange::Day);

        let logs = f.sites.logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].message.starts_with("Manual clean"));
        assert_eq!(f.sites.total_cleared().await.unwrap(), 1);

        f.sites.clear_logs().await.unwrap();
        assert_eq!(f.sites.total_cleared().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_global_interval_zero_disables() {
        let f = fixture();
        f.sites.add_site("example.com").await.unwrap();
        f.sites.set_global_interval(Some(10)).await.unwrap();
        assert_eq!(f.alarms.active().len(), 1);

        let schedule = f.sites.set_global_interval(Some(0)).await.unwrap();
        assert!(!schedule.enabled);
        assert!(f.alarms.active().is_empty());
    }
}
