//! 基于 tokio broadcast 的通知出口

use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::events::{LiveUpdate, NotificationSink};

/// 广播通知器，每个 WebSocket 连接订阅一个接收端
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<String>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotificationSink for BroadcastNotifier {
    fn publish(&self, update: LiveUpdate) {
        let event = update.event_name();
        match self.sender.send(update.to_message()) {
            Ok(receivers) => debug!(event, receivers, "Live update published"),
            Err(_) => debug!(event, "No live-update subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn test_subscribers_receive_messages() {
        let notifier = BroadcastNotifier::default();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);

        notifier.publish(LiveUpdate::ExcelDataUpdated(None));

        for rx in [&mut first, &mut second] {
            let message: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(message["event"], "excel_data_updated");
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let notifier = BroadcastNotifier::new(4);
        notifier.publish(LiveUpdate::NuevoEstatusUpdated { last_updated: None });
        assert_eq!(notifier.subscriber_count(), 0);
    }
}
