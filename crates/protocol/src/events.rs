use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A typed event with a stable bus name.
pub trait BusEvent: Serialize + DeserializeOwned {
    const NAME: &'static str;
}

/// Envelope carried by the bus. `origin_uuid` is stamped by the publisher
/// and identifies the node that emitted the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_uuid: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl BusMessage {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            origin_uuid: None,
            payload,
        }
    }

    pub fn from_event<E: BusEvent>(event: &E) -> serde_json::Result<Self> {
        Ok(Self::new(E::NAME, serde_json::to_value(event)?))
    }

    #[must_use]
    pub fn with_origin(mut self, origin_uuid: impl Into<String>) -> Self {
        self.origin_uuid = Some(origin_uuid.into());
        self
    }

    #[must_use]
    pub fn is<E: BusEvent>(&self) -> bool {
        self.name == E::NAME
    }

    /// Decodes the payload as `E`; `None` when the name does not match.
    pub fn decode<E: BusEvent>(&self) -> Option<serde_json::Result<E>> {
        self.is::<E>()
            .then(|| serde_json::from_value(self.payload.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Starting,
    Completed,
}

/// Emitted once per request after all of its commands were attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestHandlersProgressEvent {
    pub uuid: Uuid,
    #[serde(default)]
    pub context: Option<Value>,
    pub status: ProgressStatus,
}

impl BusEvent for RequestHandlersProgressEvent {
    const NAME: &'static str = "request_handlers_progress";
}

/// Emitted around one telephony reload, attributed to every request that
/// asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsteriskReloadProgressEvent {
    pub uuid: Uuid,
    pub status: ProgressStatus,
    pub command: String,
    #[serde(default)]
    pub request_uuids: Vec<Uuid>,
}

impl BusEvent for AsteriskReloadProgressEvent {
    const NAME: &'static str = "asterisk_reload_progress";
}
