use crate::{Command, ExecutorId, Request};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Hooks invoked by the request queue, under its lock, on enqueue and
/// dequeue.
pub trait RequestOptimizer: Send + Sync {
    fn on_request_put(&self, request: &Request);
    fn on_request_get(&self, request: &Request);
}

type CacheKey = (ExecutorId, String);

/// Collapses identical in-flight commands into one execution.
///
/// The first queued command for a given `(executor, value)` is the
/// representative: it stays in the cache until dequeued and collects the
/// uuids of every later request asking for the same thing. Those later
/// commands are flagged optimized and skipped at execution time.
pub struct DuplicateRequestOptimizer {
    executors: Vec<ExecutorId>,
    cache: Mutex<HashMap<CacheKey, Arc<Command>>>,
}

impl DuplicateRequestOptimizer {
    pub fn new(executor: ExecutorId) -> Self {
        Self::for_executors([executor])
    }

    pub fn for_executors(executors: impl IntoIterator<Item = ExecutorId>) -> Self {
        Self {
            executors: executors.into_iter().collect(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn is_cached(&self, executor: ExecutorId, value: &str) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(executor, value.to_string()))
    }

    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn scoped<'a>(&'a self, request: &'a Request) -> impl Iterator<Item = &'a Arc<Command>> {
        request
            .commands()
            .iter()
            .filter(|command| self.executors.contains(&command.executor_id()))
    }
}

fn cache_key(command: &Command) -> CacheKey {
    (command.executor_id(), command.value().to_string())
}

impl RequestOptimizer for DuplicateRequestOptimizer {
    fn on_request_put(&self, request: &Request) {
        for command in self.scoped(request) {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            match cache.get(&cache_key(command)) {
                Some(actual) => {
                    command.mark_optimized();
                    actual.attach_request(request.uuid());
                    debug!(
                        "Command \"{}\" of request {} merged into a queued duplicate",
                        command.value(),
                        request.uuid()
                    );
                }
                None => {
                    cache.insert(cache_key(command), Arc::clone(command));
                }
            }
        }
    }

    fn on_request_get(&self, request: &Request) {
        for command in self.scoped(request) {
            if command.is_optimized() {
                continue;
            }
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            let key = cache_key(command);
            if cache
                .get(&key)
                .is_some_and(|cached| Arc::ptr_eq(cached, command))
            {
                cache.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Executor, Result};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use sysconf_protocol::RequestOptions;
    use uuid::Uuid;

    const SCOPED: ExecutorId = ExecutorId::new("scoped");

    struct NamedExecutor(ExecutorId);

    #[async_trait]
    impl Executor for NamedExecutor {
        fn id(&self) -> ExecutorId {
            self.0
        }

        async fn execute(
            &self,
            _command: &Command,
            _data: &Value,
            _options: &RequestOptions,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn request(values: &[(&str, ExecutorId)]) -> Request {
        let uuid = Uuid::new_v4();
        let commands = values
            .iter()
            .map(|(value, id)| {
                Command::new(*value, uuid, Arc::new(NamedExecutor(*id)), Value::Null)
            })
            .collect();
        Request::new(uuid, commands, None)
    }

    #[test]
    fn second_identical_command_is_optimized() {
        let optimizer = DuplicateRequestOptimizer::new(SCOPED);
        let first = request(&[("a", SCOPED)]);
        let second = request(&[("a", SCOPED)]);

        optimizer.on_request_put(&first);
        assert!(!first.commands()[0].is_optimized());

        optimizer.on_request_put(&second);

        assert!(!first.commands()[0].is_optimized());
        assert!(second.commands()[0].is_optimized());
        assert_eq!(
            first.commands()[0].request_uuids(),
            vec![first.uuid(), second.uuid()]
        );
    }

    #[test]
    fn other_executors_are_ignored() {
        let other = ExecutorId::new("other");
        let optimizer = DuplicateRequestOptimizer::new(SCOPED);
        let mixed = request(&[("a", SCOPED), ("a", other)]);
        let duplicate = request(&[("a", other)]);

        optimizer.on_request_put(&mixed);
        optimizer.on_request_put(&duplicate);

        assert!(mixed.commands().iter().all(|c| !c.is_optimized()));
        assert!(!duplicate.commands()[0].is_optimized());
        assert_eq!(optimizer.cached_len(), 1);
    }

    #[test]
    fn different_values_are_kept() {
        let optimizer = DuplicateRequestOptimizer::new(SCOPED);
        let both = request(&[("a", SCOPED), ("b", SCOPED)]);

        optimizer.on_request_put(&both);

        assert!(both.commands().iter().all(|c| !c.is_optimized()));
        assert!(optimizer.is_cached(SCOPED, "a"));
        assert!(optimizer.is_cached(SCOPED, "b"));
    }

    #[test]
    fn dequeue_of_representative_opens_new_window() {
        let optimizer = DuplicateRequestOptimizer::new(SCOPED);
        let first = request(&[("a", SCOPED)]);
        let second = request(&[("a", SCOPED)]);
        let third = request(&[("a", SCOPED)]);

        optimizer.on_request_put(&first);
        optimizer.on_request_put(&second);
        optimizer.on_request_get(&first);
        assert!(!optimizer.is_cached(SCOPED, "a"));

        optimizer.on_request_put(&third);

        assert!(second.commands()[0].is_optimized());
        assert!(!third.commands()[0].is_optimized());
        assert!(optimizer.is_cached(SCOPED, "a"));
    }

    #[test]
    fn dequeue_of_optimized_command_keeps_cache() {
        let optimizer = DuplicateRequestOptimizer::new(SCOPED);
        let first = request(&[("a", SCOPED)]);
        let second = request(&[("a", SCOPED)]);

        optimizer.on_request_put(&first);
        optimizer.on_request_put(&second);
        optimizer.on_request_get(&second);

        assert!(optimizer.is_cached(SCOPED, "a"));
    }

    #[test]
    fn compound_key_separates_scoped_executors() {
        let other = ExecutorId::new("other");
        let optimizer = DuplicateRequestOptimizer::for_executors([SCOPED, other]);
        let first = request(&[("a", SCOPED)]);
        let second = request(&[("a", other)]);

        optimizer.on_request_put(&first);
        optimizer.on_request_put(&second);

        assert!(!second.commands()[0].is_optimized());
        assert_eq!(optimizer.cached_len(), 2);
    }
}
