use crate::observer::{RequestCompletedEventObserver, SyncRequestObserver};
use crate::{Request, RequestError, RequestFactory, RequestQueue, Result};
use log::{error, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use sysconf_bus::EventPublisher;
use sysconf_protocol::{RequestAccepted, RequestOptions};

pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlingMode {
    /// Return as soon as the request is queued.
    Asynchronous,
    /// Wait up to `timeout` for the request to be executed.
    Synchronous { timeout: Duration },
}

/// Entry point of the pipeline: payload in, request uuid out.
pub struct RequestHandlers {
    factory: RequestFactory,
    queue: Arc<RequestQueue>,
    completed: Arc<RequestCompletedEventObserver>,
    mode: HandlingMode,
}

impl RequestHandlers {
    pub fn new(
        factory: RequestFactory,
        queue: Arc<RequestQueue>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            factory,
            queue,
            completed: Arc::new(RequestCompletedEventObserver::new(publisher)),
            mode: HandlingMode::Asynchronous,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: HandlingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builds and queues a request.
    ///
    /// Only a malformed payload is an error, and it never reaches the queue.
    /// In synchronous mode a wait timeout is logged and the uuid is still
    /// returned; the request stays queued.
    pub async fn handle_request(
        &self,
        payload: &Value,
        options: RequestOptions,
    ) -> Result<RequestAccepted> {
        let request = self.build(payload, options)?;
        let uuid = request.uuid();

        match self.mode {
            HandlingMode::Asynchronous => {
                self.queue.put(request);
                info!("Request {uuid} queued");
            }
            HandlingMode::Synchronous { timeout } => {
                let sync = Arc::new(SyncRequestObserver::new(timeout));
                request.add_observer(sync.clone());
                self.queue.put(request);
                info!("Request {uuid} queued, waiting for execution");
                if !sync.wait().await {
                    warn!(
                        "Request {uuid} was not executed within {}s, returning anyway",
                        timeout.as_secs_f32()
                    );
                }
            }
        }

        Ok(RequestAccepted { request_uuid: uuid })
    }

    /// Queues a request without waiting for it, whatever the handling mode.
    /// Used from bus subscribers, which must not block event dispatch.
    pub fn enqueue(&self, payload: &Value, options: RequestOptions) -> Result<RequestAccepted> {
        let request = self.build(payload, options)?;
        let uuid = request.uuid();
        self.queue.put(request);
        info!("Request {uuid} queued");
        Ok(RequestAccepted { request_uuid: uuid })
    }

    fn build(&self, payload: &Value, options: RequestOptions) -> Result<Arc<Request>> {
        let request = match self.factory.new_request(payload, options) {
            Ok(request) => Arc::new(request),
            Err(err) => {
                error!("Error while creating request from {payload}: {err}");
                return Err(match err {
                    RequestError::InvalidRequest(_) => err,
                    other => RequestError::InvalidRequest(other.to_string()),
                });
            }
        };
        request.add_observer(self.completed.clone());
        Ok(request)
    }
}
