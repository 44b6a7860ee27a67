use async_trait::async_trait;
use scrubber_core::host::{Notifier, UiNotification};
use tokio::sync::mpsc;

/// Delivers notifications over a channel to a listening UI
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<UiNotification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiNotification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, notification: UiNotification) -> scrubber_core::Result<()> {
        self.sender
            .send(notification)
            .map_err(|_| scrubber_core::Error::Notify("No UI is listening".to_string()))
    }
}

/// Notifier for contexts with no live UI; records the notification in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: UiNotification) -> scrubber_core::Result<()> {
        tracing::info!("UI notification: {:?}", notification);
        Ok(())
    }
}
