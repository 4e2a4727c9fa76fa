//! `<module>.<action>.<id>` commands relayed as agent and queue bus events.

use crate::{Command, CommandFactory, Executor, ExecutorId, RequestError, Result};
use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use sysconf_bus::EventPublisher;
use sysconf_protocol::{BusMessage, RequestOptions};
use uuid::Uuid;

pub const AGENTBUS_EXECUTOR: ExecutorId = ExecutorId::new("agentbus");

const COMMAND_PATTERN: &str = r"^(\w+\.\w+)\.(\d+)$";

fn event_name(action: &str) -> Option<&'static str> {
    Some(match action {
        "agent.edit" => "agent_edited",
        "agent.delete" => "agent_deleted",
        "queue.add" => "queue_created",
        "queue.edit" => "queue_edited",
        "queue.delete" => "queue_deleted",
        _ => return None,
    })
}

/// Parsed form handed to the executor as command data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentBusCommand {
    pub name: String,
    pub id: u64,
}

pub struct AgentBusCommandFactory {
    executor: Arc<dyn Executor>,
    pattern: Regex,
}

impl AgentBusCommandFactory {
    pub fn new(executor: Arc<dyn Executor>) -> Result<Self> {
        Ok(Self {
            executor,
            pattern: Regex::new(COMMAND_PATTERN)?,
        })
    }

    fn parse(&self, value: &str) -> Result<AgentBusCommand> {
        let captures = self
            .pattern
            .captures(value)
            .ok_or_else(|| RequestError::InvalidCommand(format!("malformed value {value:?}")))?;
        let action = &captures[1];
        let name = event_name(action)
            .ok_or_else(|| RequestError::InvalidCommand(format!("unsupported action {action}")))?;
        let id = captures[2]
            .parse()
            .map_err(|_| RequestError::InvalidCommand(format!("id out of range in {value:?}")))?;
        Ok(AgentBusCommand {
            name: name.to_string(),
            id,
        })
    }
}

impl CommandFactory for AgentBusCommandFactory {
    fn new_command(&self, value: &str, request: Uuid, options: RequestOptions) -> Result<Command> {
        let data = serde_json::to_value(self.parse(value)?)?;
        Ok(Command::new(value, request, Arc::clone(&self.executor), data).with_options(options))
    }
}

pub struct AgentBusExecutor {
    publisher: Arc<dyn EventPublisher>,
}

impl AgentBusExecutor {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl Executor for AgentBusExecutor {
    fn id(&self) -> ExecutorId {
        AGENTBUS_EXECUTOR
    }

    async fn execute(
        &self,
        _command: &Command,
        data: &Value,
        options: &RequestOptions,
    ) -> Result<()> {
        let command: AgentBusCommand = serde_json::from_value(data.clone())?;
        if !options.publish {
            debug!("Not publishing {} for {}", command.name, command.id);
            return Ok(());
        }
        self.publisher
            .publish(BusMessage::new(command.name, json!({ "id": command.id })))?;
        Ok(())
    }
}
