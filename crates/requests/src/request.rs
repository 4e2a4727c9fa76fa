use crate::Command;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Notified once after a request's commands were all attempted.
pub trait RequestObserver: Send + Sync {
    fn on_request_executed(&self, request: &Request);
}

/// An ordered batch of commands built from one payload.
///
/// Membership of `commands` is fixed at construction; the commands
/// themselves may still be flagged or cross-attributed by the optimizer.
pub struct Request {
    uuid: Uuid,
    commands: Vec<Arc<Command>>,
    context: Option<Value>,
    observers: Mutex<Vec<Arc<dyn RequestObserver>>>,
}

impl Request {
    pub fn new(uuid: Uuid, commands: Vec<Command>, context: Option<Value>) -> Self {
        Self {
            uuid,
            commands: commands.into_iter().map(Arc::new).collect(),
            context,
            observers: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[must_use]
    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    #[must_use]
    pub const fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    pub fn add_observer(&self, observer: Arc<dyn RequestObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Executes commands in order, then notifies observers. Observers are
    /// drained, so a second call never notifies twice.
    pub async fn execute(&self) {
        for command in &self.commands {
            command.execute().await;
        }

        let observers = std::mem::take(
            &mut *self
                .observers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for observer in observers {
            observer.on_request_executed(self);
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("uuid", &self.uuid)
            .field("commands", &self.commands)
            .field("context", &self.context)
            .field("observers", &self.observer_count())
            .finish()
    }
}
