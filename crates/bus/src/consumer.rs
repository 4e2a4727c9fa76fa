use crate::LocalBus;
use async_trait::async_trait;
use log::{debug, error, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use sysconf_protocol::BusMessage;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn on_message(&self, message: &BusMessage) -> anyhow::Result<()>;
}

type Subscriptions = HashMap<String, Vec<Arc<dyn Subscriber>>>;

/// Routes bus messages to the subscribers registered for their name.
///
/// A failing subscriber is logged and never stops the dispatch of the
/// same message to the others.
#[derive(Clone, Default)]
pub struct BusConsumer {
    subscriptions: Arc<Mutex<Subscriptions>>,
}

impl BusConsumer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event_name: impl Into<String>, subscriber: Arc<dyn Subscriber>) {
        let mut guard = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.entry(event_name.into()).or_default().push(subscriber);
    }

    #[must_use]
    pub fn subscription_count(&self, event_name: &str) -> usize {
        let guard = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.get(event_name).map_or(0, Vec::len)
    }

    pub async fn dispatch(&self, message: &BusMessage) {
        let subscribers = {
            let guard = self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.get(&message.name).cloned().unwrap_or_default()
        };

        for subscriber in subscribers {
            if let Err(err) = subscriber.on_message(message).await {
                error!("Handler for event '{}' failed: {err:#}", message.name);
            }
        }
    }

    /// Spawns the dispatch loop; it ends when the bus is dropped.
    pub fn start(&self, bus: &LocalBus) -> JoinHandle<()> {
        let mut receiver = bus.subscribe();
        let consumer = self.clone();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => consumer.dispatch(&message).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Bus consumer lagged behind, {skipped} events skipped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Bus closed, stopping consumer");
                        break;
                    }
                }
            }
        })
    }
}
