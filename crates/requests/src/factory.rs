use crate::{Command, CommandFactory, Request, RequestError, Result};
use log::{error, warn};
use serde_json::{Map, Value};
use std::sync::Arc;
use sysconf_protocol::{RequestOptions, CONTEXT_KEY};
use uuid::Uuid;

/// A payload key and the factory that builds its commands.
#[derive(Clone)]
pub struct CommandCategory {
    key: String,
    factory: Arc<dyn CommandFactory>,
}

impl CommandCategory {
    pub fn new(key: impl Into<String>, factory: Arc<dyn CommandFactory>) -> Self {
        Self {
            key: key.into(),
            factory,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Builds requests from category-keyed payloads.
///
/// Categories are visited in construction order, whatever the key order of
/// the payload: telephony reloads must run before the ownership fixes that
/// depend on them.
pub struct RequestFactory {
    categories: Vec<CommandCategory>,
}

impl RequestFactory {
    pub fn new(categories: Vec<CommandCategory>) -> Self {
        Self { categories }
    }

    /// Fails only on a malformed payload; individual bad values are logged
    /// and dropped.
    pub fn new_request(&self, payload: &Value, options: RequestOptions) -> Result<Request> {
        let args = payload.as_object().ok_or_else(|| {
            RequestError::InvalidRequest("payload must be a JSON object".to_string())
        })?;

        let uuid = Uuid::new_v4();
        let mut commands = Vec::new();
        for category in &self.categories {
            append_commands(category, args, uuid, options, &mut commands)?;
        }

        let context = args.get(CONTEXT_KEY).filter(|v| !v.is_null()).cloned();
        Ok(Request::new(uuid, commands, context))
    }
}

fn append_commands(
    category: &CommandCategory,
    args: &Map<String, Value>,
    request: Uuid,
    options: RequestOptions,
    commands: &mut Vec<Command>,
) -> Result<()> {
    let key = category.key();
    let values = match args.get(key) {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(values)) => values,
        Some(other) => {
            return Err(RequestError::InvalidRequest(format!(
                "\"{key}\" must be a list of strings, got {other}"
            )));
        }
    };

    for value in values {
        let Some(raw) = value.as_str() else {
            warn!("Invalid \"{key}\" command {value}: not a string");
            continue;
        };
        match category.factory.new_command(raw, request, options) {
            Ok(command) => commands.push(command),
            Err(err) if err.is_invalid_input() => {
                warn!("Invalid \"{key}\" command {raw:?}: {err}");
            }
            Err(err) => error!("Error while creating \"{key}\" command {raw:?}: {err}"),
        }
    }
    Ok(())
}
