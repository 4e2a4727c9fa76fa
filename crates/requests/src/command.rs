use crate::{Executor, ExecutorId, Result};
use futures::FutureExt;
use log::{debug, error, info};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use sysconf_protocol::RequestOptions;
use uuid::Uuid;

/// One executable instruction bound to an executor.
///
/// `value` is the raw instruction and the deduplication key, `data` is what
/// the executor actually consumes. Once deduplicated, a command can be
/// attributed to several requests.
pub struct Command {
    value: String,
    executor: Arc<dyn Executor>,
    data: Value,
    options: RequestOptions,
    optimized: AtomicBool,
    requests: Mutex<Vec<Uuid>>,
}

impl Command {
    pub fn new(
        value: impl Into<String>,
        request: Uuid,
        executor: Arc<dyn Executor>,
        data: Value,
    ) -> Self {
        Self {
            value: value.into(),
            executor,
            data,
            options: RequestOptions::default(),
            optimized: AtomicBool::new(false),
            requests: Mutex::new(vec![request]),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn executor_id(&self) -> ExecutorId {
        self.executor.id()
    }

    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    #[must_use]
    pub const fn options(&self) -> RequestOptions {
        self.options
    }

    #[must_use]
    pub fn is_optimized(&self) -> bool {
        self.optimized.load(Ordering::Acquire)
    }

    pub(crate) fn mark_optimized(&self) {
        self.optimized.store(true, Ordering::Release);
    }

    /// Requests this command reports to, in attribution order.
    #[must_use]
    pub fn request_uuids(&self) -> Vec<Uuid> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn attach_request(&self, request: Uuid) {
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        if !requests.contains(&request) {
            requests.push(request);
        }
    }

    /// Runs the executor unless the command was optimized out. Executor
    /// failures and panics are logged here and never reach the caller.
    pub async fn execute(&self) {
        if self.is_optimized() {
            debug!(
                "Not executing command \"{}\" since it has been optimized out",
                self.value
            );
            return;
        }

        info!("Executing command \"{}\"", self.value);
        let outcome = AssertUnwindSafe(self.executor.execute(self, &self.data, &self.options))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(
                "Error while executing command \"{}\" with {}: {err}",
                self.value,
                self.executor.id()
            ),
            Err(panic) => error!(
                "Executor {} panicked on command \"{}\": {}",
                self.executor.id(),
                self.value,
                panic_message(panic.as_ref())
            ),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("value", &self.value)
            .field("executor", &self.executor.id())
            .field("data", &self.data)
            .field("optimized", &self.is_optimized())
            .field("requests", &self.request_uuids())
            .finish()
    }
}

/// Validates raw values of one category and turns them into commands.
pub trait CommandFactory: Send + Sync {
    fn new_command(&self, value: &str, request: Uuid, options: RequestOptions) -> Result<Command>;
}

/// Accepts any value and hands it to the executor unchanged.
pub struct SimpleCommandFactory {
    executor: Arc<dyn Executor>,
}

impl SimpleCommandFactory {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

impl CommandFactory for SimpleCommandFactory {
    fn new_command(&self, value: &str, request: Uuid, options: RequestOptions) -> Result<Command> {
        Ok(Command::new(
            value,
            request,
            Arc::clone(&self.executor),
            Value::String(value.to_string()),
        )
        .with_options(options))
    }
}
