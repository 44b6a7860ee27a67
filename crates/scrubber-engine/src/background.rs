use crate::lock::{LockManager, LockState};
use crate::messages::{Request, Response};
use crate::scheduler::Scheduler;
use scrubber_core::Result;
use std::sync::Arc;

/// The background context: owns alarms and the idle lock, answers the UI
pub struct Background {
    scheduler: Arc<Scheduler>,
    lock: Arc<LockManager>,
}

impl Background {
    pub fn new(scheduler: Arc<Scheduler>, lock: Arc<LockManager>) -> Self {
        Self { scheduler, lock }
    }

    /// Bring the background up after install or browser start
    ///
    /// Re-locks when a password is set, then re-arms every alarm.
    pub async fn startup(&self) -> Result<LockState> {
        let state = self.lock.cold_start().await?;
        match self.scheduler.reconcile_all_timers().await {
            Ok(report) => tracing::info!(
                "Startup armed {} alarm(s), cleaned {} entries",
                report.armed.len(),
                report.purged
            ),
            Err(e) => tracing::warn!("Failed to arm alarms at startup: {}", e),
        }
        Ok(state)
    }

    /// Single dispatch point for every UI request
    pub async fn dispatch(&self, request: Request) -> Result<Response> {
        tracing::debug!("Received {}", request.action());
        match request {
            Request::UpdateAlarm {
                url,
                scheduled,
                interval,
            } => {
                self.scheduler
                    .set_site_schedule(&url, scheduled, interval)
                    .await?;
                Ok(Response::ok())
            }
            Request::CheckLockStatus {
                last_open_time,
                lock_time,
            } => {
                let should_lock = self
                    .lock
                    .check_lock_status(last_open_time, lock_time)
                    .await?;
                Ok(Response::LockStatus { should_lock })
            }
            Request::ResetLockTimer {
                lock_time,
                last_open_time,
            } => {
                self.lock.reset_lock_timer(lock_time, last_open_time).await?;
                Ok(Response::ok())
            }
            Request::PopupClosed {
                used_time,
                lock_time,
            } => {
                self.lock.popup_closed(used_time, lock_time).await?;
                Ok(Response::ok())
            }
        }
    }

    /// An alarm went off; failures are logged
    pub async fn on_alarm(&self, alarm_name: &str) {
        match self.scheduler.on_timer_fire(alarm_name).await {
            Ok(Some(count)) => tracing::debug!("Alarm {} cleaned {} entries", alarm_name, count),
            Ok(None) => {}
            Err(e) => tracing::warn!("Cleanup for alarm {} failed: {}", alarm_name, e),
        }
    }

    /// Periodic idle check while the UI is open
    pub async fn on_idle_tick(&self) {
        if let Err(e) = self.lock.on_idle_tick().await {
            tracing::warn!("Idle lock check failed: {}", e);
        }
    }

    /// When the idle lock should next be checked, if the UI is open
    pub async fn idle_deadline(&self) -> Option<i64> {
        self.lock.idle_deadline().await
    }
}
