//! Password gate in front of the UI.
//!
//! `locked` in storage is the source of truth the UI consults on every open.
//! The background only raises `shouldLock`, which the UI folds into `locked`
//! the next time it opens. Passwords are stored and compared as plain text.

use scrubber_core::clock::Clock;
use scrubber_core::host::{Notifier, UiNotification};
use scrubber_core::settings::{DEFAULT_LOCK_TIMEOUT_SECS, LockConfig, Settings, secs_to_ms};
use scrubber_core::{Error, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LockState {
    Unlocked,
    Locked,
    /// No password configured; behaves as permanently unlocked
    NoPasswordSet,
}

impl LockState {
    fn of(config: &LockConfig) -> Self {
        if !config.password_set() {
            LockState::NoPasswordSet
        } else if config.locked {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked)
    }
}

/// Background view of the UI session; lost when the background restarts
#[derive(Debug, Clone, Copy)]
struct Session {
    ui_open: bool,
    lock_time_secs: u64,
    last_open_time: i64,
}

pub struct LockManager {
    settings: Settings,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    session: Mutex<Session>,
}

impl LockManager {
    pub fn new(settings: Settings, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        let now = clock.now_ms();
        Self {
            settings,
            clock,
            notifier,
            session: Mutex::new(Session {
                ui_open: false,
                lock_time_secs: DEFAULT_LOCK_TIMEOUT_SECS,
                last_open_time: now,
            }),
        }
    }

    /// Current state as stored, without applying the idle check
    pub async fn state(&self) -> Result<LockState> {
        Ok(LockState::of(&self.settings.lock_config().await?))
    }

    // UI side

    /// Run the check the UI performs whenever it opens or sees activity
    ///
    /// A pending `shouldLock` or an expired idle window locks; otherwise the
    /// idle window restarts from now.
    pub async fn check_on_open(&self) -> Result<LockState> {
        let config = self.settings.lock_config().await?;
        let now = self.clock.now_ms();

        if !config.password_set() {
            self.settings.save_last_open_time(now).await?;
            return Ok(LockState::NoPasswordSet);
        }
        if config.locked {
            return Ok(LockState::Locked);
        }
        if config.should_lock || config.idle_expired(now) {
            tracing::info!("Idle window elapsed, locking");
            self.settings.save_lock_flags(true, false).await?;
            return Ok(LockState::Locked);
        }

        self.settings.save_last_open_time(now).await?;
        Ok(LockState::Unlocked)
    }

    /// Configure the first password and lock immediately
    ///
    /// An empty password is a valid password.
    pub async fn set_password(&self, password: &str, hint: Option<&str>) -> Result<LockState> {
        let config = self.settings.lock_config().await?;
        if config.password_set() {
            return Err(Error::PasswordAlreadySet);
        }
        self.settings.save_password(password, hint).await?;
        self.settings.save_lock_flags(true, false).await?;
        tracing::info!("Password set, locked");
        Ok(LockState::Locked)
    }

    pub async fn change_password(&self, old: &str, new: &str, hint: Option<&str>) -> Result<()> {
        let config = self.settings.lock_config().await?;
        if !config.password_set() {
            return Err(Error::NoPassword);
        }
        if !config.password_matches(old) {
            return Err(Error::PasswordMismatch);
        }
        self.settings.save_password(new, hint).await?;
        tracing::info!("Password changed");
        Ok(())
    }

    /// Lock right away; requires a password
    pub async fn lock_now(&self) -> Result<LockState> {
        let config = self.settings.lock_config().await?;
        if !config.password_set() {
            return Err(Error::NoPassword);
        }
        self.settings.save_locked(true).await?;
        Ok(LockState::Locked)
    }

    /// Unlock with `attempt`; any attempt succeeds when no password is set
    ///
    /// A wrong attempt changes nothing and may be retried without limit.
    pub async fn unlock(&self, attempt: &str) -> Result<LockState> {
        let config = self.settings.lock_config().await?;
        if !config.password_matches(attempt) {
            tracing::debug!("Unlock attempt rejected");
            return Err(Error::PasswordMismatch);
        }

        let now = self.clock.now_ms();
        self.settings.save_unlocked_at(now).await?;
        self.session.lock().await.last_open_time = now;
        Ok(if config.password_set() {
            LockState::Unlocked
        } else {
            LockState::NoPasswordSet
        })
    }

    /// The hint only; the password itself is never revealed
    pub async fn password_hint(&self) -> Result<Option<String>> {
        let config = self.settings.lock_config().await?;
        if !config.password_set() {
            return Err(Error::NoPassword);
        }
        Ok(config.password_hint)
    }

    pub async fn set_lock_timeout(&self, secs: u64) -> Result<()> {
        if secs == 0 {
            return Err(Error::Validation(
                "Lock time must be a positive number of seconds".to_string(),
            ));
        }
        self.settings.save_lock_timeout(secs).await?;
        self.session.lock().await.lock_time_secs = secs;
        Ok(())
    }

    pub async fn lock_timeout(&self) -> Result<u64> {
        Ok(self.settings.lock_config().await?.lock_timeout_secs)
    }

    // Background side

    /// Called once when the background starts
    ///
    /// Any configured password forces a lock, whatever was stored before.
    pub async fn cold_start(&self) -> Result<LockState> {
        let config = self.settings.lock_config().await?;
        let now = self.clock.now_ms();
        {
            let mut session = self.session.lock().await;
            session.ui_open = false;
            session.lock_time_secs = config.lock_timeout_secs;
            session.last_open_time = config.last_open_time.unwrap_or(now);
        }

        if config.password_set() {
            self.settings.save_lock_flags(true, true).await?;
            tracing::info!("Started with a password set, locked");
            Ok(LockState::Locked)
        } else {
            self.settings.save_lock_flags(false, false).await?;
            tracing::info!("Started without a password, staying unlocked");
            Ok(LockState::NoPasswordSet)
        }
    }

    /// Decide whether the UI should lock given its last open time
    pub async fn check_lock_status(&self, last_open_time: i64, lock_time_secs: u64) -> Result<bool> {
        let used = self.clock.now_ms().saturating_sub(last_open_time);
        let should_lock = used >= secs_to_ms(lock_time_secs);
        self.settings.save_should_lock(should_lock).await?;
        tracing::debug!("Lock check: used {} ms, should lock: {}", used, should_lock);
        Ok(should_lock)
    }

    /// The UI opened or saw activity; restart the idle window
    pub async fn reset_lock_timer(&self, lock_time_secs: u64, last_open_time: i64) -> Result<()> {
        {
            let mut session = self.session.lock().await;
            session.ui_open = true;
            if lock_time_secs > 0 {
                session.lock_time_secs = lock_time_secs;
            }
            session.last_open_time = last_open_time;
        }
        self.settings.save_last_open_time(last_open_time).await?;
        self.settings.save_should_lock(false).await?;
        tracing::debug!("Lock timer reset ({} s)", lock_time_secs);
        Ok(())
    }

    /// The UI closed; flag a lock for next time if the window ran out
    pub async fn popup_closed(&self, used_time_ms: i64, lock_time_secs: u64) -> Result<bool> {
        let session = {
            let mut session = self.session.lock().await;
            session.ui_open = false;
            *session
        };
        let used = self.clock.now_ms().saturating_sub(session.last_open_time);
        tracing::debug!(
            "UI closed after {} ms (UI reported {} ms, lock time {} s)",
            used,
            used_time_ms,
            lock_time_secs
        );

        if used >= secs_to_ms(session.lock_time_secs) {
            self.settings.save_should_lock(true).await?;
            Ok(true)
        } else {
            self.settings.save_should_lock(false).await?;
            self.settings
                .save_last_open_time(session.last_open_time)
                .await?;
            Ok(false)
        }
    }

    /// When the idle timer should fire, if the UI is open
    pub async fn idle_deadline(&self) -> Option<i64> {
        let session = self.session.lock().await;
        session
            .ui_open
            .then(|| {
                session
                    .last_open_time
                    .saturating_add(secs_to_ms(session.lock_time_secs))
            })
    }

    /// Lock if the UI has been idle past its deadline; returns whether it locked
    ///
    /// The idle timer fires once per UI session; the next `resetLockTimer`
    /// arms it again.
    pub async fn on_idle_tick(&self) -> Result<bool> {
        {
            let mut session = self.session.lock().await;
            let deadline = session
                .last_open_time
                .saturating_add(secs_to_ms(session.lock_time_secs));
            if !session.ui_open || self.clock.now_ms() < deadline {
                return Ok(false);
            }
            session.ui_open = false;
        }
        self.lock_plugin().await
    }

    /// Lock and tell an open UI to show the lock screen
    pub async fn lock_plugin(&self) -> Result<bool> {
        let config = self.settings.lock_config().await?;
        if !config.password_set() {
            tracing::debug!("No password set, not locking");
            return Ok(false);
        }

        self.settings.save_lock_flags(true, false).await?;
        tracing::info!("Locked after idle timeout");
        if let Err(e) = self.notifier.notify(UiNotification::LockPlugin).await {
            tracing::warn!("Failed to notify UI of lock: {}", e);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrubber_core::clock::ManualClock;
    use scrubber_core::memory::MemoryStore;
    use scrubber_host::ChannelNotifier;
    use tokio::sync::mpsc::UnboundedReceiver;

    const NOW: i64 = 1_700_000_000_000;

    fn manager() -> (
        LockManager,
        Settings,
        ManualClock,
        UnboundedReceiver<UiNotification>,
    ) {
        let settings = Settings::new(Arc::new(MemoryStore::new()));
        let clock = ManualClock::new(NOW);
        let (notifier, receiver) = ChannelNotifier::new();
        let manager = LockManager::new(settings.clone(), Arc::new(clock.clone()), Arc::new(notifier));
        (manager, settings, clock, receiver)
    }

    #[tokio::test]
    async fn test_password_round_trip() {
        let (lock, _settings, _clock, _rx) = manager();
        assert_eq!(lock.state().await.unwrap(), LockState::NoPasswordSet);

        assert_eq!(lock.set_password("abc", Some("letters")).await.unwrap(), LockState::Locked);
        assert_eq!(lock.state().await.unwrap(), LockState::Locked);

        assert!(matches!(lock.unlock("xyz").await, Err(Error::PasswordMismatch)));
        assert_eq!(lock.state().await.unwrap(), LockState::Locked);

        assert_eq!(lock.unlock("abc").await.unwrap(), LockState::Unlocked);
        assert_eq!(lock.state().await.unwrap(), LockState::Unlocked);
    }

    #[tokio::test]
    async fn test_no_password_is_always_unlocked() {
        let (lock, settings, _clock, _rx) = manager();
        assert_eq!(lock.unlock("anything").await.unwrap(), LockState::NoPasswordSet);
        assert!(matches!(lock.lock_now().await, Err(Error::NoPassword)));
        assert_eq!(lock.check_on_open().await.unwrap(), LockState::NoPasswordSet);
        assert_eq!(
            settings.lock_config().await.unwrap().last_open_time,
            Some(NOW)
        );
    }

    #[tokio::test]
    async fn test_set_password_twice_is_rejected() {
        let (lock, _settings, _clock, _rx) = manager();
        lock.set_password("", None).await.unwrap();
        assert!(matches!(
            lock.set_password("other", None).await,
            Err(Error::PasswordAlreadySet)
        ));
        // The empty password still unlocks
        assert_eq!(lock.unlock("").await.unwrap(), LockState::Unlocked);
    }

    #[tokio::test]
    async fn test_change_password_requires_old() {
        let (lock, _settings, _clock, _rx) = manager();
        lock.set_password("abc", Some("old hint")).await.unwrap();

        assert!(matches!(
            lock.change_password("wrong", "new", None).await,
            Err(Error::PasswordMismatch)
        ));
        lock.change_password("abc", "new", Some("new hint")).await.unwrap();

        assert!(lock.unlock("abc").await.is_err());
        assert_eq!(lock.unlock("new").await.unwrap(), LockState::Unlocked);
        assert_eq!(lock.password_hint().await.unwrap().as_deref(), Some("new hint"));
    }

    #[tokio::test]
    async fn test_hint_never_reveals_password() {
        let (lock, _settings, _clock, _rx) = manager();
        assert!(matches!(lock.password_hint().await, Err(Error::NoPassword)));
        lock.set_password("secret", None).await.unwrap();
        assert_eq!(lock.password_hint().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_check_slides_idle_window() {
        let (lock, settings, clock, _rx) = manager();
        lock.set_password("abc", None).await.unwrap();
        lock.set_lock_timeout(60).await.unwrap();
        lock.unlock("abc").await.unwrap();

        clock.advance_secs(50);
        assert_eq!(lock.check_on_open().await.unwrap(), LockState::Unlocked);
        clock.advance_secs(50);
        assert_eq!(lock.check_on_open().await.unwrap(), LockState::Unlocked);
        assert_eq!(
            settings.lock_config().await.unwrap().last_open_time,
            Some(NOW + 100_000)
        );

        clock.advance_secs(60);
        assert_eq!(lock.check_on_open().await.unwrap(), LockState::Locked);
        assert!(settings.lock_config().await.unwrap().locked);
    }

    #[tokio::test]
    async fn test_should_lock_is_folded_into_locked_on_open() {
        let (lock, settings, _clock, _rx) = manager();
        lock.set_password("abc", None).await.unwrap();
        lock.unlock("abc").await.unwrap();
        settings.save_should_lock(true).await.unwrap();

        assert_eq!(lock.check_on_open().await.unwrap(), LockState::Locked);
        let config = settings.lock_config().await.unwrap();
        assert!(config.locked);
        assert!(!config.should_lock);
    }

    #[tokio::test]
    async fn test_cold_start_relocks_when_password_set() {
        let (lock, settings, _clock, _rx) = manager();
        settings.save_password("abc", None).await.unwrap();
        settings.save_lock_flags(false, false).await.unwrap();

        assert_eq!(lock.cold_start().await.unwrap(), LockState::Locked);
        let config = settings.lock_config().await.unwrap();
        assert!(config.locked);
        assert!(config.should_lock);
    }

    #[tokio::test]
    async fn test_cold_start_without_password_unlocks() {
        let (lock, settings, _clock, _rx) = manager();
        settings.save_lock_flags(true, true).await.unwrap();

        assert_eq!(lock.cold_start().await.unwrap(), LockState::NoPasswordSet);
        let config = settings.lock_config().await.unwrap();
        assert!(!config.locked);
        assert!(!config.should_lock);
    }

    #[tokio::test]
    async fn test_lock_timeout_validation() {
        let (lock, _settings, _clock, _rx) = manager();
        assert!(matches!(lock.set_lock_timeout(0).await, Err(Error::Validation(_))));
        assert_eq!(lock.lock_timeout().await.unwrap(), DEFAULT_LOCK_TIMEOUT_SECS);
        lock.set_lock_timeout(30).await.unwrap();
        assert_eq!(lock.lock_timeout().await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_check_lock_status_persists_should_lock() {
        let (lock, settings, _clock, _rx) = manager();
        assert!(lock.check_lock_status(NOW - 301_000, 300).await.unwrap());
        assert!(settings.lock_config().await.unwrap().should_lock);

        assert!(!lock.check_lock_status(NOW - 10_000, 300).await.unwrap());
        assert!(!settings.lock_config().await.unwrap().should_lock);
    }

    #[tokio::test]
    async fn test_popup_closed_after_timeout_flags_lock() {
        let (lock, settings, clock, _rx) = manager();
        lock.reset_lock_timer(60, NOW).await.unwrap();

        clock.advance_secs(30);
        assert!(!lock.popup_closed(30_000, 60).await.unwrap());
        assert!(!settings.lock_config().await.unwrap().should_lock);

        lock.reset_lock_timer(60, NOW).await.unwrap();
        clock.advance_secs(40);
        assert!(lock.popup_closed(70_000, 60).await.unwrap());
        assert!(settings.lock_config().await.unwrap().should_lock);
    }

    #[tokio::test]
    async fn test_idle_timer_locks_open_ui_and_notifies() {
        let (lock, settings, clock, mut rx) = manager();
        lock.set_password("abc", None).await.unwrap();
        lock.unlock("abc").await.unwrap();

        assert_eq!(lock.idle_deadline().await, None);
        lock.reset_lock_timer(60, NOW).await.unwrap();
        assert_eq!(lock.idle_deadline().await, Some(NOW + 60_000));

        clock.advance_secs(59);
        assert!(!lock.on_idle_tick().await.unwrap());

        clock.advance_secs(1);
        assert!(lock.on_idle_tick().await.unwrap());
        assert!(settings.lock_config().await.unwrap().locked);
        assert_eq!(rx.recv().await, Some(UiNotification::LockPlugin));
    }

    #[tokio::test]
    async fn test_idle_timer_fires_once_per_session() {
        let (lock, _settings, clock, mut rx) = manager();
        lock.set_password("abc", None).await.unwrap();
        lock.unlock("abc").await.unwrap();
        lock.reset_lock_timer(60, NOW).await.unwrap();

        clock.advance_secs(60);
        let mut locks = 0;
        for _ in 0..5 {
            if lock.on_idle_tick().await.unwrap() {
                locks += 1;
            }
            clock.advance_secs(1);
        }
        assert_eq!(locks, 1);
        assert_eq!(rx.try_recv().ok(), Some(UiNotification::LockPlugin));
        assert!(rx.try_recv().is_err());
        assert_eq!(lock.idle_deadline().await, None);

        // A new UI session re-arms the timer
        lock.unlock("abc").await.unwrap();
        lock.reset_lock_timer(60, clock.now_ms()).await.unwrap();
        clock.advance_secs(60);
        assert!(lock.on_idle_tick().await.unwrap());
    }

    #[tokio::test]
    async fn test_extreme_lock_times_do_not_overflow() {
        let (lock, settings, _clock, _rx) = manager();
        assert!(!lock.check_lock_status(0, 10_000_000_000_000_000).await.unwrap());
        assert!(!lock.check_lock_status(0, u64::MAX).await.unwrap());
        assert!(lock.check_lock_status(i64::MIN, 300).await.unwrap());
        assert!(!lock.check_lock_status(i64::MAX, 0).await.unwrap());
        assert!(settings.lock_config().await.is_ok());

        lock.reset_lock_timer(u64::MAX, i64::MAX).await.unwrap();
        assert_eq!(lock.idle_deadline().await, Some(i64::MAX));
        assert!(!lock.on_idle_tick().await.unwrap());
        assert!(!lock.popup_closed(i64::MAX, u64::MAX).await.unwrap());

        lock.reset_lock_timer(300, i64::MIN).await.unwrap();
        assert!(lock.popup_closed(0, 300).await.unwrap());
    }

    #[tokio::test]
    async fn test_idle_timer_without_password_does_nothing() {
        let (lock, settings, clock, mut rx) = manager();
        lock.reset_lock_timer(1, NOW).await.unwrap();
        clock.advance_secs(5);

        assert!(!lock.on_idle_tick().await.unwrap());
        assert!(!settings.lock_config().await.unwrap().locked);
        assert!(rx.try_recv().is_err());
    }
}
