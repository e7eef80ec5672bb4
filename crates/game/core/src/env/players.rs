use glam::Vec2;

use crate::state::EntityId;

/// What an agent may know about a player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerView {
    pub id: EntityId,
    pub position: Vec2,
    /// False once the player's health reached zero.
    pub alive: bool,
}

/// Registry of player entities, keyed by stable identity.
///
/// Agents never hold a reference to a player; they keep the id and resolve it
/// through this registry every time they need the player. A failed lookup is
/// the normal way a destroyed player shows up.
pub trait PlayerRegistry: Send + Sync {
    fn resolve(&self, id: EntityId) -> Option<PlayerView>;

    /// Whether `id` still names a player in this session.
    fn is_live(&self, id: EntityId) -> bool {
        self.resolve(id).is_some()
    }
}
