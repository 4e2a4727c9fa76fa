//! # Sysconf Bus
//!
//! Publish/subscribe plumbing for progress events.
//!
//! ```text
//! executors / observers
//!     │ publish(BusMessage)      (origin_uuid stamped)
//!     ▼
//! LocalBus (tokio broadcast) <── deliver(BusMessage) from a peer transport
//!     │
//!     └──> BusConsumer dispatch loop
//!            └─> Subscriber::on_message for every subscription of that name
//! ```

mod consumer;
mod error;
mod local;
mod publisher;

pub use consumer::{BusConsumer, Subscriber};
pub use error::{BusError, Result};
pub use local::{LocalBus, DEFAULT_BUS_CAPACITY};
pub use publisher::{EventPublisher, EventPublisherExt};
