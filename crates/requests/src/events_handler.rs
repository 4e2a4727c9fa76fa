use crate::RequestHandlers;
use anyhow::Context;
use async_trait::async_trait;
use log::{debug, info};
use serde_json::json;
use std::sync::Arc;
use sysconf_bus::{BusConsumer, Subscriber};
use sysconf_protocol::{
    AsteriskReloadProgressEvent, BusEvent, BusMessage, ProgressStatus, RequestOptions, IPBX_KEY,
    REQUEST_UUIDS_KEY,
};

/// Mirrors telephony reloads started on peer nodes.
///
/// Only `starting` events emitted by another node are replayed, and they
/// are replayed silently so the local reload does not echo back.
pub struct ReloadEventHandler {
    node_uuid: String,
    handlers: Arc<RequestHandlers>,
}

impl ReloadEventHandler {
    pub fn new(node_uuid: impl Into<String>, handlers: Arc<RequestHandlers>) -> Self {
        Self {
            node_uuid: node_uuid.into(),
            handlers,
        }
    }

    pub fn subscribe(self: Arc<Self>, consumer: &BusConsumer) {
        consumer.subscribe(AsteriskReloadProgressEvent::NAME, self);
    }

    fn is_from_peer(&self, message: &BusMessage) -> bool {
        message
            .origin_uuid
            .as_deref()
            .is_some_and(|origin| !origin.is_empty() && origin != self.node_uuid)
    }
}

#[async_trait]
impl Subscriber for ReloadEventHandler {
    async fn on_message(&self, message: &BusMessage) -> anyhow::Result<()> {
        let Some(event) = message.decode::<AsteriskReloadProgressEvent>() else {
            return Ok(());
        };
        let event = event.context("malformed asterisk reload event")?;

        if event.status != ProgressStatus::Starting {
            return Ok(());
        }
        if !self.is_from_peer(message) {
            debug!("Ignoring local reload event {}", event.uuid);
            return Ok(());
        }

        info!(
            "Replaying \"{}\" reload started by {}",
            event.command,
            message.origin_uuid.as_deref().unwrap_or_default()
        );
        let payload = json!({
            IPBX_KEY: [event.command],
            REQUEST_UUIDS_KEY: event.request_uuids,
        });
        // queued without waiting even in synchronous mode: this runs on the
        // bus dispatch loop
        self.handlers.enqueue(&payload, RequestOptions::silent())?;
        Ok(())
    }
}
