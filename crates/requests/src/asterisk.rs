//! Telephony engine control: allow-listed `asterisk -rx` commands.

use crate::{
    Command, CommandFactory, Executor, ExecutorId, ProcessRunner, RequestError, Result,
};
use async_trait::async_trait;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use sysconf_bus::{EventPublisher, EventPublisherExt};
use sysconf_protocol::{AsteriskReloadProgressEvent, ProgressStatus, RequestOptions};
use uuid::Uuid;

pub const ASTERISK_EXECUTOR: ExecutorId = ExecutorId::new("asterisk");

const PJSIP_RELOAD: &str = "module reload res_pjsip.so";

const ALLOWED_COMMANDS: &[&str] = &[
    "core reload",
    "core restart now",
    "dialplan reload",
    "moh reload",
    "iax2 reload",
    "module reload app_queue.so",
    "module reload features",
    "module reload res_parking.so",
    PJSIP_RELOAD,
    "voicemail reload",
    "module reload chan_sccp.so",
    "module reload app_confbridge.so",
    "module reload res_rtp_asterisk.so",
    "module reload res_hep.so",
];

/// Commands taking a free-form argument, e.g. `sccp reset SEP0011223344`.
const ALLOWED_PREFIXES: &[&str] = &["sccp reset"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteriskSettings {
    pub control_program: String,
    pub reload_max_attempts: u32,
    pub reload_backoff_ms: u64,
    /// Control output meaning a previous reload is still running.
    pub reload_busy_marker: String,
    /// Run before reloading res_pjsip; empty disables it.
    pub pjsip_invalidate_command: Vec<String>,
}

impl Default for AsteriskSettings {
    fn default() -> Self {
        Self {
            control_program: "asterisk".to_string(),
            reload_max_attempts: 10,
            reload_backoff_ms: 1000,
            reload_busy_marker: "The previous reload command didn't finish yet".to_string(),
            pjsip_invalidate_command: ["wazo-confgen", "asterisk/pjsip.conf", "--invalidate"]
                .map(String::from)
                .to_vec(),
        }
    }
}

pub struct AsteriskCommandFactory {
    executor: Arc<dyn Executor>,
}

impl AsteriskCommandFactory {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    fn check_validity(value: &str) -> Result<()> {
        if ALLOWED_COMMANDS.contains(&value)
            || ALLOWED_PREFIXES.iter().any(|prefix| value.starts_with(prefix))
        {
            Ok(())
        } else {
            Err(RequestError::UnauthorizedCommand)
        }
    }
}

impl CommandFactory for AsteriskCommandFactory {
    fn new_command(&self, value: &str, request: Uuid, options: RequestOptions) -> Result<Command> {
        Self::check_validity(value)?;
        Ok(Command::new(
            value,
            request,
            Arc::clone(&self.executor),
            Value::String(value.to_string()),
        )
        .with_options(options))
    }
}

pub struct AsteriskCommandExecutor {
    publisher: Arc<dyn EventPublisher>,
    runner: Arc<dyn ProcessRunner>,
    settings: AsteriskSettings,
}

impl AsteriskCommandExecutor {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        runner: Arc<dyn ProcessRunner>,
        settings: AsteriskSettings,
    ) -> Self {
        Self {
            publisher,
            runner,
            settings,
        }
    }

    fn publish_progress(
        &self,
        task: Uuid,
        status: ProgressStatus,
        command: &str,
        request_uuids: &[Uuid],
    ) {
        let event = AsteriskReloadProgressEvent {
            uuid: task,
            status,
            command: command.to_string(),
            request_uuids: request_uuids.to_vec(),
        };
        if let Err(err) = self.publisher.publish_event(&event) {
            warn!("Failed to publish reload progress of \"{command}\": {err}");
        }
    }

    async fn invalidate_pjsip(&self) {
        let Some((program, args)) = self.settings.pjsip_invalidate_command.split_first() else {
            return;
        };
        match self.runner.run(program, args).await {
            Ok(output) if output.success() => {}
            Ok(output) => warn!("{program} returned status {:?}", output.exit_code),
            Err(err) => warn!("Failed to run {program}: {err}"),
        }
    }

    /// Retries while the engine reports a reload in progress. Only a
    /// failure to launch the control program is an error.
    async fn run_control_command(&self, command: &str) -> Result<()> {
        let program = &self.settings.control_program;
        let args = ["-rx".to_string(), command.to_string()];
        let attempts = self.settings.reload_max_attempts.max(1);
        let backoff = Duration::from_millis(self.settings.reload_backoff_ms);

        for attempt in 1..=attempts {
            let output = self.runner.run(program, &args).await?;
            if !output.stdout.contains(&self.settings.reload_busy_marker) {
                if !output.success() {
                    error!("{program} returned non-zero status code {:?}", output.exit_code);
                }
                return Ok(());
            }
            if attempt < attempts {
                debug!("Reload in progress, retrying \"{command}\" ({attempt}/{attempts})");
                tokio::time::sleep(backoff).await;
            }
        }

        error!("Giving up on \"{command}\" after {attempts} attempts: reload still in progress");
        Ok(())
    }
}

#[async_trait]
impl Executor for AsteriskCommandExecutor {
    fn id(&self) -> ExecutorId {
        ASTERISK_EXECUTOR
    }

    async fn execute(
        &self,
        command: &Command,
        data: &Value,
        options: &RequestOptions,
    ) -> Result<()> {
        let command_string = data
            .as_str()
            .ok_or_else(|| RequestError::InvalidCommand(format!("expected a string, got {data}")))?;
        let request_uuids = command.request_uuids();
        let task = Uuid::new_v4();

        if options.publish {
            self.publish_progress(task, ProgressStatus::Starting, command_string, &request_uuids);
        }

        if command_string == PJSIP_RELOAD {
            self.invalidate_pjsip().await;
        }
        let result = self.run_control_command(command_string).await;

        if options.publish {
            self.publish_progress(task, ProgressStatus::Completed, command_string, &request_uuids);
        }
        result
    }
}
