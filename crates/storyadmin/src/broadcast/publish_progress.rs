//! Publish progress broadcaster for real-time streaming.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::publish::progress::{PublishProgress, PublishProgressEvent};

/// Fans publish progress events out to every subscriber.
#[derive(Clone)]
pub struct PublishProgressBroadcaster {
    sender: Arc<broadcast::Sender<PublishProgressEvent>>,
}

impl PublishProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: PublishProgressEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishProgressEvent> {
        self.sender.subscribe()
    }

    /// Starts tracking a new publish with its own operation id.
    pub fn start_publish(&self) -> PublishProgress {
        PublishProgress::new(Arc::clone(&self.sender))
    }
}

impl Default for PublishProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::progress::PublishPhase;

    #[test]
    fn test_send_receive() {
        let broadcaster = PublishProgressBroadcaster::new(10);
        let mut rx = broadcaster.subscribe();

        broadcaster.send(PublishProgressEvent::new(
            "op",
            PublishPhase::Pushing,
            "Pushing",
        ));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.operation_id, "op");
        assert_eq!(received.phase, PublishPhase::Pushing);
    }

    #[test]
    fn test_start_publish_uses_fresh_ids() {
        let broadcaster = PublishProgressBroadcaster::default();
        let mut rx = broadcaster.subscribe();

        let first = broadcaster.start_publish();
        let second = broadcaster.start_publish();
        assert_ne!(first.operation_id(), second.operation_id());

        first.phase(PublishPhase::Cloning, "Cloning");
        let received = rx.try_recv().unwrap();
        assert_eq!(received.operation_id, first.operation_id());
        assert_eq!(received.phase, PublishPhase::Cloning);
    }

    #[test]
    fn test_multiple_subscribers() {
        let broadcaster = PublishProgressBroadcaster::new(4);
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        broadcaster.start_publish().completed("done");

        assert_eq!(a.try_recv().unwrap().phase, PublishPhase::Completed);
        assert_eq!(b.try_recv().unwrap().phase, PublishPhase::Completed);
    }
}
