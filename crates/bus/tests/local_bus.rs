//! Dispatch loop wired to a live LocalBus

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use sysconf_bus::{BusConsumer, EventPublisher, LocalBus, Subscriber};
use sysconf_protocol::BusMessage;
use tokio::sync::mpsc;

struct Forward(mpsc::UnboundedSender<BusMessage>);

#[async_trait]
impl Subscriber for Forward {
    async fn on_message(&self, message: &BusMessage) -> anyhow::Result<()> {
        self.0.send(message.clone())?;
        Ok(())
    }
}

#[tokio::test]
async fn consumer_receives_published_and_delivered_messages() {
    let bus = LocalBus::new("node-a", 16);
    let consumer = BusConsumer::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    consumer.subscribe("asterisk_reload_progress", Arc::new(Forward(tx)));
    let _loop = consumer.start(&bus);

    bus.publish(BusMessage::new("ignored", json!({}))).unwrap();
    bus.publish(BusMessage::new("asterisk_reload_progress", json!({"n": 1})))
        .unwrap();
    bus.deliver(
        BusMessage::new("asterisk_reload_progress", json!({"n": 2})).with_origin("node-b"),
    );

    let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.payload, json!({"n": 1}));
    assert_eq!(first.origin_uuid.as_deref(), Some("node-a"));
    assert_eq!(second.payload, json!({"n": 2}));
    assert_eq!(second.origin_uuid.as_deref(), Some("node-b"));
}
