use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Telephony engine commands (`"dialplan reload"`, `"sccp reset SEP..."`).
pub const IPBX_KEY: &str = "ipbx";
/// Agent/queue change notifications (`"agent.edit.44"`).
pub const AGENTBUS_KEY: &str = "agentbus";
/// Ownership fix of the generated autoprov configuration file.
pub const CHOWN_AUTOPROV_CONFIG_KEY: &str = "chown_autoprov_config";
/// Opaque caller metadata echoed back in the completion event.
pub const CONTEXT_KEY: &str = "context";
/// Request identifiers carried over from a peer-originated reload.
pub const REQUEST_UUIDS_KEY: &str = "request_uuids";

/// Per-call options threaded from `handle_request` down to executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// When false, executors keep their progress events to themselves.
    #[serde(default = "default_publish")]
    pub publish: bool,
}

const fn default_publish() -> bool {
    true
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            publish: default_publish(),
        }
    }
}

impl RequestOptions {
    #[must_use]
    pub const fn silent() -> Self {
        Self { publish: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAccepted {
    pub request_uuid: Uuid,
}
