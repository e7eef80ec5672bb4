//! Binary wire format for bus frames.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use arena_core::{DamageRequest, ReplicatedEvent};

use super::bus::Topic;

/// Everything that travels between instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Frame {
    /// Authoritative agent event; applying it is idempotent.
    Event(ReplicatedEvent),
    /// Weapon hit reported by an instance that does not own the target.
    Intake(DamageRequest),
    /// Asks the session authority to rebroadcast its full view.
    ResyncRequest,
}

impl Frame {
    pub fn topic(&self) -> Topic {
        match self {
            Frame::Event(_) => Topic::Replication,
            Frame::Intake(_) => Topic::Intake,
            Frame::ResyncRequest => Topic::Control,
        }
    }
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to encode frame")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode frame")]
    Decode(#[source] bincode::Error),
}

pub fn encode(frame: &Frame) -> Result<Vec<u8>, WireError> {
    bincode::serialize(frame).map_err(WireError::Encode)
}

pub fn decode(bytes: &[u8]) -> Result<Frame, WireError> {
    bincode::deserialize(bytes).map_err(WireError::Decode)
}
