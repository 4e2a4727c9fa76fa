use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use sysconf_bus::DEFAULT_BUS_CAPACITY;
use sysconf_requests::{AsteriskSettings, ChownAutoprovSettings, HandlingMode, DEFAULT_SYNC_TIMEOUT};
use uuid::Uuid;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/wazo-sysconfd/config.toml";

/// Environment fallback for the node uuid.
pub const NODE_UUID_ENV: &str = "XIVO_UUID";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub request_handlers: RequestHandlersConfig,
    pub bus: BusConfig,
    pub asterisk: AsteriskSettings,
    pub chown_autoprov: ChownAutoprovSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestHandlersConfig {
    pub synchronous: bool,
    pub sync_timeout_secs: u64,
}

impl Default for RequestHandlersConfig {
    fn default() -> Self {
        Self {
            synchronous: false,
            sync_timeout_secs: DEFAULT_SYNC_TIMEOUT.as_secs(),
        }
    }
}

impl RequestHandlersConfig {
    pub fn mode(&self) -> HandlingMode {
        if self.synchronous {
            HandlingMode::Synchronous {
                timeout: Duration::from_secs(self.sync_timeout_secs),
            }
        } else {
            HandlingMode::Asynchronous
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

impl Config {
    /// A missing file means defaults; an unreadable or malformed one is an
    /// error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Fills in `uuid` from the environment or a fresh one when unset.
    pub fn resolve_node_uuid(&mut self, env_uuid: Option<String>) -> &str {
        let resolved = self
            .uuid
            .take()
            .filter(|uuid| !uuid.is_empty())
            .or_else(|| env_uuid.filter(|uuid| !uuid.is_empty()))
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        self.uuid.insert(resolved)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to render config")
    }
}
