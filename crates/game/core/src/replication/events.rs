use glam::Vec2;

use crate::agent::ELITE_PREFIX;
use crate::state::{AgentState, EntityId};

/// Initialization payload carried by the spawn primitive.
///
/// The elite flag travels here and nowhere else; it is never replicated as a
/// mutable field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnPayload {
    pub agent: EntityId,
    pub seq: u64,
    /// Key into the agent template catalog.
    pub template: String,
    pub display_name: String,
    pub position: Vec2,
    pub facing: Vec2,
    pub is_elite: bool,
}

impl SpawnPayload {
    /// Name shown to players, carrying the elite prefix when it applies.
    pub fn shown_name(&self) -> String {
        if self.is_elite {
            format!("{ELITE_PREFIX}{}", self.display_name)
        } else {
            self.display_name.clone()
        }
    }
}

/// Damage outcome decided by the authority.
///
/// `agent` is the emitting agent, whose sequence space `seq` belongs to. For
/// weapon hits it is also the target; for contact damage the target is a
/// player and `resulting_health` is left to the player's health component.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageEvent {
    pub agent: EntityId,
    pub seq: u64,
    pub target: EntityId,
    pub attacker: EntityId,
    pub amount: f32,
    pub resulting_health: Option<f32>,
    pub will_destroy: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnockbackEvent {
    pub agent: EntityId,
    pub seq: u64,
    pub target: EntityId,
    pub attacker: EntityId,
    pub power: f32,
    /// Where the push originates. Receivers compute the direction against
    /// their own view of the target's position.
    pub source: Vec2,
}

/// Everything an authority broadcasts about an agent.
///
/// Every variant carries its final value, so applying an event twice or out
/// of order converges on the same state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplicatedEvent {
    Spawned(SpawnPayload),
    Damage(DamageEvent),
    Knockback(KnockbackEvent),
    StateChanged {
        agent: EntityId,
        seq: u64,
        state: AgentState,
        target: Option<EntityId>,
    },
    ChaseIndicator {
        agent: EntityId,
        seq: u64,
        visible: bool,
    },
    Transform {
        agent: EntityId,
        seq: u64,
        position: Vec2,
        facing: Vec2,
        velocity: Vec2,
    },
    Despawned {
        agent: EntityId,
        seq: u64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Spawned,
    Damage,
    Knockback,
    StateChanged,
    ChaseIndicator,
    Transform,
    Despawned,
}

impl ReplicatedEvent {
    /// The agent whose sequence space the event belongs to.
    pub fn agent(&self) -> EntityId {
        match self {
            Self::Spawned(payload) => payload.agent,
            Self::Damage(event) => event.agent,
            Self::Knockback(event) => event.agent,
            Self::StateChanged { agent, .. }
            | Self::ChaseIndicator { agent, .. }
            | Self::Transform { agent, .. }
            | Self::Despawned { agent, .. } => *agent,
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            Self::Spawned(payload) => payload.seq,
            Self::Damage(event) => event.seq,
            Self::Knockback(event) => event.seq,
            Self::StateChanged { seq, .. }
            | Self::ChaseIndicator { seq, .. }
            | Self::Transform { seq, .. }
            | Self::Despawned { seq, .. } => *seq,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Spawned(_) => EventKind::Spawned,
            Self::Damage(_) => EventKind::Damage,
            Self::Knockback(_) => EventKind::Knockback,
            Self::StateChanged { .. } => EventKind::StateChanged,
            Self::ChaseIndicator { .. } => EventKind::ChaseIndicator,
            Self::Transform { .. } => EventKind::Transform,
            Self::Despawned { .. } => EventKind::Despawned,
        }
    }

    /// Entity that receives the effect. Differs from [`Self::agent`] for
    /// contact damage and knockback dealt to players.
    pub fn subject(&self) -> EntityId {
        match self {
            Self::Damage(event) => event.target,
            Self::Knockback(event) => event.target,
            other => other.agent(),
        }
    }

    /// Whether this event is aimed at something other than its emitting
    /// agent.
    pub fn targets_other_entity(&self) -> bool {
        self.subject() != self.agent()
    }
}

/// Weapon hit reported on an instance that is not authoritative for the
/// target. Forwarded to the authority, which decides the outcome.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageRequest {
    pub agent: EntityId,
    pub amount: f32,
    pub attacker: EntityId,
}
