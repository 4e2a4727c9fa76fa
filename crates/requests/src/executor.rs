use crate::{Command, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::process::Stdio;
use sysconf_protocol::RequestOptions;

/// Category tag of an executor. Deduplication scopes compare these by
/// value, never by object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutorId(&'static str);

impl ExecutorId {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ExecutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Performs the side effect of one command category.
///
/// Only the request processor calls `execute`, one command at a time.
#[async_trait]
pub trait Executor: Send + Sync {
    fn id(&self) -> ExecutorId;

    async fn execute(
        &self,
        command: &Command,
        data: &Value,
        options: &RequestOptions,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
}

impl ProcessOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Runs external programs on behalf of executors.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executor_ids_compare_by_name() {
        const A: ExecutorId = ExecutorId::new("asterisk");
        assert_eq!(A, ExecutorId::new("asterisk"));
        assert_ne!(A, ExecutorId::new("chown_autoprov_config"));
        assert_eq!(A.to_string(), "asterisk");
    }

    #[test]
    fn output_success_requires_zero_exit() {
        let ok = ProcessOutput {
            exit_code: Some(0),
            stdout: String::new(),
        };
        let failed = ProcessOutput {
            exit_code: Some(1),
            ..ok.clone()
        };
        let killed = ProcessOutput {
            exit_code: None,
            ..ok.clone()
        };
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }
}
