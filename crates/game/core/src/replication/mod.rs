//! Replication event model.
//!
//! The authority emits [`ReplicatedEvent`]s into an agent's [`Outbox`]; the
//! runtime broadcasts them to every instance, the origin included. Receivers
//! apply them last-write-wins per field using [`Versioned`].
mod events;
mod fields;

pub use events::{
    DamageEvent, DamageRequest, EventKind, KnockbackEvent, ReplicatedEvent, SpawnPayload,
};
pub use fields::Versioned;

/// Events produced since the last drain, in emission order.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    events: Vec<ReplicatedEvent>,
}

impl Outbox {
    pub fn push(&mut self, event: ReplicatedEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = ReplicatedEvent> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
