use crate::{Request, RequestObserver};
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use sysconf_bus::{EventPublisher, EventPublisherExt};
use sysconf_protocol::{ProgressStatus, RequestHandlersProgressEvent};
use tokio::sync::watch;

/// Announces request completion on the bus.
pub struct RequestCompletedEventObserver {
    publisher: Arc<dyn EventPublisher>,
}

impl RequestCompletedEventObserver {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }
}

impl RequestObserver for RequestCompletedEventObserver {
    fn on_request_executed(&self, request: &Request) {
        let event = RequestHandlersProgressEvent {
            uuid: request.uuid(),
            context: request.context().cloned(),
            status: ProgressStatus::Completed,
        };
        if let Err(err) = self.publisher.publish_event(&event) {
            warn!(
                "Failed to publish completion of request {}: {err}",
                request.uuid()
            );
        }
    }
}

/// Lets a synchronous caller wait for its request to be executed.
pub struct SyncRequestObserver {
    executed: watch::Sender<bool>,
    timeout: Duration,
}

impl SyncRequestObserver {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let (executed, _) = watch::channel(false);
        Self { executed, timeout }
    }

    /// `true` once executed, `false` if the timeout elapsed first.
    pub async fn wait(&self) -> bool {
        let mut executed = self.executed.subscribe();
        // the watch guard borrows `executed`, release it before returning
        let released = tokio::time::timeout(self.timeout, executed.wait_for(|done| *done))
            .await
            .is_ok_and(|changed| changed.is_ok());
        released
    }
}

impl RequestObserver for SyncRequestObserver {
    fn on_request_executed(&self, _request: &Request) {
        self.executed.send_replace(true);
    }
}
