use crate::Result;
use sysconf_protocol::{BusEvent, BusMessage};

/// The one capability the request pipeline needs from a bus client.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, message: BusMessage) -> Result<()>;
}

pub trait EventPublisherExt: EventPublisher {
    /// Wraps a typed event in its envelope and publishes it.
    fn publish_event<E: BusEvent>(&self, event: &E) -> Result<()> {
        self.publish(BusMessage::from_event(event)?)
    }
}

impl<T: EventPublisher + ?Sized> EventPublisherExt for T {}
