use async_trait::async_trait;
use scrubber_core::host::AlarmService;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// An alarm going off, delivered to whoever drains the receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmFire {
    pub name: String,
}

struct ActiveAlarm {
    period_minutes: u32,
    task: JoinHandle<()>,
}

/// Recurring alarms backed by tokio timers
///
/// Each alarm is a task that sends an [`AlarmFire`] every period; the first
/// fire happens one full period after creation.
pub struct TokioAlarms {
    alarms: Mutex<BTreeMap<String, ActiveAlarm>>,
    sender: mpsc::UnboundedSender<AlarmFire>,
    minute: Duration,
}

impl TokioAlarms {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlarmFire>) {
        Self::with_minute(Duration::from_secs(60))
    }

    /// Use a custom length for one "minute" of period
    pub fn with_minute(minute: Duration) -> (Self, mpsc::UnboundedReceiver<AlarmFire>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                alarms: Mutex::new(BTreeMap::new()),
                sender,
                minute,
            },
            receiver,
        )
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ActiveAlarm>> {
        self.alarms.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn period_of(&self, name: &str) -> Option<u32> {
        self.lock().get(name).map(|a| a.period_minutes)
    }
}

impl Drop for TokioAlarms {
    fn drop(&mut self) {
        for (_, alarm) in self.lock().iter() {
            alarm.task.abort();
        }
    }
}

#[async_trait]
impl AlarmService for TokioAlarms {
    async fn create(&self, name: &str, period_minutes: u32) -> scrubber_core::Result<()> {
        if period_minutes == 0 {
            return Err(scrubber_core::Error::Alarm(format!(
                "Alarm {} needs a period of at least one minute",
                name
            )));
        }

        let period = self.minute * period_minutes;
        let sender = self.sender.clone();
        let alarm_name = name.to_string();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                tracing::trace!("Alarm fired: {}", alarm_name);
                if sender
                    .send(AlarmFire {
                        name: alarm_name.clone(),
                    })
                    .is_err()
                {
                    break;
                }
            }
        });

        let previous = self.lock().insert(
            name.to_string(),
            ActiveAlarm {
                period_minutes,
                task,
            },
        );
        if let Some(previous) = previous {
            previous.task.abort();
        }
        Ok(())
    }

    async fn clear(&self, name: &str) -> scrubber_core::Result<bool> {
        match self.lock().remove(name) {
            Some(alarm) => {
                alarm.task.abort();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn names(&self) -> scrubber_core::Result<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}

#[derive(Debug, Default)]
struct MemoryAlarmsInner {
    alarms: BTreeMap<String, u32>,
    fail_creates: bool,
    created: usize,
}

/// Alarm registry that never fires on its own
#[derive(Debug, Clone, Default)]
pub struct MemoryAlarms {
    inner: Arc<Mutex<MemoryAlarmsInner>>,
}

impl MemoryAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryAlarmsInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Active alarms and their periods
    pub fn active(&self) -> BTreeMap<String, u32> {
        self.lock().alarms.clone()
    }

    /// Make every later `create` fail
    pub fn fail_creates(&self, fail: bool) {
        self.lock().fail_creates = fail;
    }

    /// Number of successful `create` calls so far
    pub fn create_count(&self) -> usize {
        self.lock().created
    }
}

#[async_trait]
impl AlarmService for MemoryAlarms {
    async fn create(&self, name: &str, period_minutes: u32) -> scrubber_core::Result<()> {
        let mut inner = self.lock();
        if inner.fail_creates {
            return Err(scrubber_core::Error::Alarm(format!(
                "Refused to create alarm {}",
                name
            )));
        }
        inner.alarms.insert(name.to_string(), period_minutes);
        inner.created += 1;
        Ok(())
    }

    async fn clear(&self, name: &str) -> scrubber_core::Result<bool> {
        Ok(self.lock().alarms.remove(name).is_some())
    }

    async fn names(&self) -> scrubber_core::Result<Vec<String>> {
        Ok(self.lock().alarms.keys().cloned().collect())
    }
}
