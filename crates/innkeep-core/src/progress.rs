// ── Progress channel ──
//
// Human-readable progress lines fanned out to any live observer. The
// pipeline publishes whether or not anyone listens; subscribers that
// lag or drop never affect it.

use tokio::sync::broadcast;
use tracing::info;

const PROGRESS_CHANNEL_SIZE: usize = 64;

/// Publish/subscribe handle for progress messages.
///
/// Owned by whoever starts a run and injected into the pipeline. Cheap
/// to clone; all clones feed the same subscribers.
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    tx: broadcast::Sender<String>,
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(PROGRESS_CHANNEL_SIZE);
        Self { tx }
    }

    /// Attach a new observer. It sees messages published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Emit a message to the log and to every current subscriber.
    pub fn publish(&self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "innkeep::progress", "{message}");
        // No receivers is the normal headless case.
        let _ = self.tx.send(message);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let progress = ProgressChannel::new();
        progress.publish("nobody listening");
        assert_eq!(progress.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_messages_in_order() {
        let progress = ProgressChannel::new();
        let mut a = progress.subscribe();
        let mut b = progress.clone().subscribe();

        progress.publish("one");
        progress.publish("two");

        assert_eq!(a.recv().await.unwrap(), "one");
        assert_eq!(a.recv().await.unwrap(), "two");
        assert_eq!(b.recv().await.unwrap(), "one");
    }

    #[test]
    fn dropped_subscriber_does_not_disturb_others() {
        let progress = ProgressChannel::new();
        let dropped = progress.subscribe();
        let mut kept = progress.subscribe();
        drop(dropped);

        progress.publish("still here");
        assert_eq!(kept.try_recv().unwrap(), "still here");
        assert_eq!(progress.subscriber_count(), 1);
    }
}
