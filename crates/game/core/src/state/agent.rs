use glam::Vec2;

use super::{EntityId, Health};

/// Behavior state of an agent. There is no terminal state; destruction is
/// handled by the combat path.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AgentState {
    #[default]
    Roaming,
    Chasing,
}

/// Read-only view of an agent, as seen by the local instance.
///
/// On the authoritative instance this is the canonical state; on a mirror it
/// is the last replicated value of every field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentSnapshot {
    pub id: EntityId,
    pub display_name: String,
    pub template: String,
    pub is_elite: bool,
    pub scale: f32,
    pub position: Vec2,
    pub facing: Vec2,
    pub velocity: Vec2,
    pub health: Health,
    pub state: AgentState,
    pub target: Option<EntityId>,
    pub chase_indicator: bool,
    pub knockback_active: bool,
    pub destroyed: bool,
    pub authoritative: bool,
    pub last_seq: u64,
}
