//! # Sysconf Protocol
//!
//! Wire types exchanged between the request pipeline, its callers and the
//! event bus.
//!
//! ```text
//! caller ──> payload {"ipbx": [...], "chown_autoprov_config": [...], "context": ...}
//!              │
//!              └─> RequestAccepted {"request_uuid": "..."}
//!
//! bus    <── BusMessage { name, origin_uuid, payload }
//!              ├─ request_handlers_progress  (one per request)
//!              └─ asterisk_reload_progress   (starting / completed, per reload)
//! ```

mod events;
mod payload;

pub use events::{
    AsteriskReloadProgressEvent, BusEvent, BusMessage, ProgressStatus,
    RequestHandlersProgressEvent,
};
pub use payload::{
    RequestAccepted, RequestOptions, AGENTBUS_KEY, CHOWN_AUTOPROV_CONFIG_KEY, CONTEXT_KEY,
    IPBX_KEY, REQUEST_UUIDS_KEY,
};
