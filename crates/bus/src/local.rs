use crate::{EventPublisher, Result};
use log::debug;
use std::sync::Arc;
use sysconf_protocol::BusMessage;
use tokio::sync::broadcast;

pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// In-process bus backed by a broadcast channel.
///
/// Messages published here are stamped with this node's uuid. Messages
/// relayed from other nodes enter through [`LocalBus::deliver`] and keep
/// their original `origin_uuid`.
#[derive(Clone)]
pub struct LocalBus {
    inner: Arc<LocalBusInner>,
}

struct LocalBusInner {
    sender: broadcast::Sender<BusMessage>,
    origin_uuid: String,
}

impl LocalBus {
    pub fn new(origin_uuid: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(LocalBusInner {
                sender,
                origin_uuid: origin_uuid.into(),
            }),
        }
    }

    #[must_use]
    pub fn origin_uuid(&self) -> &str {
        &self.inner.origin_uuid
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.inner.sender.subscribe()
    }

    /// Injects a message received from a peer node.
    pub fn deliver(&self, message: BusMessage) {
        self.send(message);
    }

    fn send(&self, message: BusMessage) {
        let name = message.name.clone();
        // no receivers is not a failure: nobody is listening yet
        if self.inner.sender.send(message).is_err() {
            debug!("No bus subscribers for event {name}");
        }
    }
}

impl EventPublisher for LocalBus {
    fn publish(&self, message: BusMessage) -> Result<()> {
        let message = message.with_origin(self.inner.origin_uuid.clone());
        self.send(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventPublisherExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sysconf_protocol::{ProgressStatus, RequestHandlersProgressEvent};

    #[test]
    fn publish_stamps_local_origin() {
        let bus = LocalBus::new("node-a", 8);
        let mut rx = bus.subscribe();

        bus.publish(BusMessage::new("ping", json!({"n": 1}))).unwrap();

        let received = rx.try_recv().unwrap();
        assert_eq!(received.origin_uuid.as_deref(), Some("node-a"));
        assert_eq!(received.payload, json!({"n": 1}));
    }

    #[test]
    fn deliver_keeps_peer_origin() {
        let bus = LocalBus::new("node-a", 8);
        let mut rx = bus.subscribe();

        bus.deliver(BusMessage::new("ping", json!({})).with_origin("node-b"));

        assert_eq!(rx.try_recv().unwrap().origin_uuid.as_deref(), Some("node-b"));
    }

    #[test]
    fn publish_without_subscribers_is_ok() {
        let bus = LocalBus::new("node-a", 8);
        let event = RequestHandlersProgressEvent {
            uuid: uuid::Uuid::nil(),
            context: None,
            status: ProgressStatus::Completed,
        };
        assert!(bus.publish_event(&event).is_ok());
    }
}
