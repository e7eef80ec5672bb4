use bitflags::bitflags;
use glam::Vec2;

use crate::state::EntityId;

bitflags! {
    /// Collision layers used to filter overlap and ray queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LayerMask: u32 {
        /// Static geometry that blocks sight and movement.
        const OBSTACLES = 1 << 0;
        const PLAYERS   = 1 << 1;
        const AGENTS    = 1 << 2;
    }
}

/// First obstruction found along a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Entity owning the collider, if it is an entity at all.
    pub entity: Option<EntityId>,
    pub point: Vec2,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
}

/// Read-mostly physics queries shared by every agent.
pub trait PhysicsOracle: Send + Sync {
    /// Entities whose colliders overlap the circle on any layer in `mask`.
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<EntityId>;

    /// First hit on the segment `from → to` against layers in `mask`.
    fn raycast(&self, from: Vec2, to: Vec2, mask: LayerMask) -> Option<RayHit>;
}
