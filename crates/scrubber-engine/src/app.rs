use crate::background::Background;
use crate::lock::LockManager;
use crate::purge::PurgeEngine;
use crate::scheduler::Scheduler;
use crate::sites::SiteManager;
use scrubber_core::clock::Clock;
use scrubber_core::domain::DomainRule;
use scrubber_core::host::{AlarmService, HistoryService, KeyValueStore, Notifier};
use scrubber_core::settings::Settings;
use std::sync::Arc;

/// Host capabilities everything else is built on
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn KeyValueStore>,
    pub history: Arc<dyn HistoryService>,
    pub alarms: Arc<dyn AlarmService>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// All components wired against one set of collaborators
pub struct App {
    pub settings: Settings,
    pub engine: Arc<PurgeEngine>,
    pub scheduler: Arc<Scheduler>,
    pub lock: Arc<LockManager>,
    pub sites: SiteManager,
    pub background: Background,
}

impl App {
    pub fn new(collaborators: Collaborators) -> Self {
        Self::with_domain_rule(collaborators, DomainRule::default())
    }

    pub fn with_domain_rule(collaborators: Collaborators, rule: DomainRule) -> Self {
        let Collaborators {
            store,
            history,
            alarms,
            notifier,
            clock,
        } = collaborators;

        let settings = Settings::new(store);
        let engine = Arc::new(
            PurgeEngine::new(settings.clone(), history.clone(), clock.clone())
                .with_domain_rule(rule),
        );
        let scheduler = Arc::new(Scheduler::new(
            settings.clone(),
            alarms,
            engine.clone(),
            clock.clone(),
        ));
        let lock = Arc::new(LockManager::new(settings.clone(), clock, notifier));
        let sites = SiteManager::new(settings.clone(), history, engine.clone(), scheduler.clone());
        let background = Background::new(scheduler.clone(), lock.clone());

        Self {
            settings,
            engine,
            scheduler,
            lock,
            sites,
            background,
        }
    }
}
