use crate::RequestQueue;
use log::{debug, error};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The single consumer of the request queue.
///
/// Requests run strictly one after another in queue order. A request that
/// panics is logged and the loop moves on to the next one.
pub struct RequestProcessor {
    queue: Arc<RequestQueue>,
}

impl RequestProcessor {
    pub fn new(queue: Arc<RequestQueue>) -> Self {
        Self { queue }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        loop {
            self.process_next().await;
        }
    }

    /// Waits for one request and executes it to completion.
    pub async fn process_next(&self) {
        let request = self.queue.get().await;
        let uuid = request.uuid();
        debug!("Processing request {uuid}");

        let task = tokio::spawn(async move { request.execute().await });
        if let Err(err) = task.await {
            error!("Unexpected error while executing request {uuid}: {err}");
        }
    }
}
