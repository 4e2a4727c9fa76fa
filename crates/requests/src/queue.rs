use crate::{Request, RequestOptimizer};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

/// FIFO of pending requests with a single consumer.
///
/// The optimizer hooks run under the queue lock, so the dedup cache always
/// agrees with the queue contents. Lock order is queue, then optimizer.
pub struct RequestQueue {
    queue: Mutex<VecDeque<Arc<Request>>>,
    available: Notify,
    optimizer: Arc<dyn RequestOptimizer>,
}

impl RequestQueue {
    pub fn new(optimizer: Arc<dyn RequestOptimizer>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            optimizer,
        }
    }

    pub fn put(&self, request: Arc<Request>) {
        {
            let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
            queue.push_back(Arc::clone(&request));
            self.optimizer.on_request_put(&request);
        }
        self.available.notify_one();
    }

    /// Waits until a request is available and pops it.
    pub async fn get(&self) -> Arc<Request> {
        loop {
            if let Some(request) = self.try_get() {
                return request;
            }
            // a put racing with this wait leaves a permit behind
            self.available.notified().await;
        }
    }

    pub fn try_get(&self) -> Option<Arc<Request>> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let request = queue.pop_front()?;
        self.optimizer.on_request_get(&request);
        Some(request)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
