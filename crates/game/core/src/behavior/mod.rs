//! Agent behavior: the Roaming/Chasing state machine and its loops.
//!
//! Loops are stepped once per authoritative tick. Waits are explicit
//! [`Countdown`]s owned by the loop, and every loop holds a
//! [`BehaviorToken`] that a transition invalidates.
mod chase;
mod machine;
mod roam;
mod timer;

pub use chase::ChaseLoop;
pub use machine::{AgentStateMachine, BehaviorLoop, Transition, TransitionCause};
pub use roam::{RoamLoop, RoamPhase, find_reachable_point, roam_candidate};
pub use timer::{BehaviorToken, Countdown, TokenSource};

use glam::Vec2;

use crate::config::AgentConfig;
use crate::env::Collaborators;
use crate::state::EntityId;

/// Inputs shared by every loop step.
pub struct LoopContext<'a> {
    pub agent: EntityId,
    pub position: Vec2,
    pub config: &'a AgentConfig,
    pub collaborators: Collaborators<'a>,
    pub dt: f32,
}

/// What a loop step asks of its agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopSignal {
    Continue,
    /// The chase target no longer resolves; evaluate immediately.
    TargetLost,
}
