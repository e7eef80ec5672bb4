//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, the replication wire, and agent
//! spawning so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use arena_core::{EntityId, SpawnError};

use crate::events::WireError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires oracles to be configured before building")]
    MissingOracles,

    #[error("agent {0} is not known to this instance")]
    UnknownAgent(EntityId),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error(transparent)]
    Wire(#[from] WireError),
}
