//! Player registry shared by every instance of a session.
//!
//! Players are owned by the outer game. Agents only ever resolve them by id,
//! and effects aimed at a player (contact damage, knockback) are applied
//! here exactly once per `(agent, seq)`, no matter how many instances
//! observe the event.
//!
//! The emitting instance applies its own events in sequence order before
//! publishing them, so the highest applied sequence per agent is enough to
//! recognise everything seen before.
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use glam::Vec2;

use arena_core::{EntityId, Health, PlayerRegistry, PlayerView, ReplicatedEvent};

/// Seconds a knocked-back player keeps sliding. The push decays linearly.
pub const PLAYER_KNOCKBACK_SECONDS: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerRecord {
    pub id: EntityId,
    pub position: Vec2,
    pub health: Health,
}

impl PlayerRecord {
    pub fn is_alive(&self) -> bool {
        !self.health.is_depleted()
    }
}

/// What applying a player-targeted event did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerEffect {
    Damaged { player: EntityId, health: f32 },
    Pushed { player: EntityId, position: Vec2 },
    /// At or below the highest sequence already applied for that agent.
    Duplicate,
    /// Not a player-targeted event, or the player is gone.
    NotApplicable,
}

#[derive(Default)]
struct DirectoryState {
    players: BTreeMap<EntityId, PlayerRecord>,
    /// Highest applied sequence per emitting agent.
    applied: HashMap<EntityId, u64>,
}

#[derive(Default)]
pub struct PlayerDirectory {
    state: RwLock<DirectoryState>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: EntityId, position: Vec2, max_health: f32) {
        let record = PlayerRecord {
            id,
            position,
            health: Health::full(max_health),
        };
        self.write().players.insert(id, record);
        tracing::info!(target: "arena::players", player = %id, "player joined");
    }

    pub fn remove(&self, id: EntityId) -> Option<PlayerRecord> {
        let removed = self.write().players.remove(&id);
        if removed.is_some() {
            tracing::info!(target: "arena::players", player = %id, "player left");
        }
        removed
    }

    pub fn move_to(&self, id: EntityId, position: Vec2) {
        if let Some(record) = self.write().players.get_mut(&id) {
            record.position = position;
        }
    }

    pub fn get(&self, id: EntityId) -> Option<PlayerRecord> {
        self.read().players.get(&id).copied()
    }

    pub fn players(&self) -> Vec<PlayerRecord> {
        self.read().players.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.read().players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Living players whose centers lie within `radius` of `center`.
    pub fn within(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.read()
            .players
            .values()
            .filter(|record| record.is_alive() && record.position.distance(center) <= radius)
            .map(|record| record.id)
            .collect()
    }

    /// Applies contact damage or knockback aimed at a player.
    pub fn apply_effect(&self, event: &ReplicatedEvent) -> PlayerEffect {
        let (player, agent, seq) = match event {
            ReplicatedEvent::Damage(damage) => (damage.target, damage.agent, damage.seq),
            ReplicatedEvent::Knockback(push) => (push.target, push.agent, push.seq),
            _ => return PlayerEffect::NotApplicable,
        };

        let mut state = self.write();
        if !state.players.contains_key(&player) {
            return PlayerEffect::NotApplicable;
        }
        let applied = state.applied.entry(agent).or_default();
        if seq <= *applied {
            return PlayerEffect::Duplicate;
        }
        *applied = seq;
        let Some(record) = state.players.get_mut(&player) else {
            return PlayerEffect::NotApplicable;
        };

        match event {
            ReplicatedEvent::Damage(damage) => {
                record.health.current = (record.health.current - damage.amount).max(0.0);
                tracing::debug!(
                    target: "arena::players",
                    player = %player,
                    agent = %damage.agent,
                    amount = damage.amount,
                    health = record.health.current,
                    "player damaged"
                );
                if record.health.is_depleted() {
                    tracing::info!(target: "arena::players", player = %player, "player down");
                }
                PlayerEffect::Damaged {
                    player,
                    health: record.health.current,
                }
            }
            ReplicatedEvent::Knockback(push) => {
                let direction = (record.position - push.source)
                    .try_normalize()
                    .unwrap_or(Vec2::X);
                // Distance covered by a linearly decaying slide.
                record.position += direction * push.power * PLAYER_KNOCKBACK_SECONDS * 0.5;
                PlayerEffect::Pushed {
                    player,
                    position: record.position,
                }
            }
            _ => PlayerEffect::NotApplicable,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, DirectoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, DirectoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlayerRegistry for PlayerDirectory {
    fn resolve(&self, id: EntityId) -> Option<PlayerView> {
        self.get(id).map(|record| PlayerView {
            id,
            position: record.position,
            alive: record.is_alive(),
        })
    }
}
