//! Replication bus and its wire format.
mod bus;
mod wire;

pub use bus::{Envelope, PeerId, ReplicationBus, Topic};
pub use wire::{Frame, WireError, decode, encode};
