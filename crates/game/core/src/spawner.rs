//! Authoritative spawning.
//!
//! The spawner only decides *what* to spawn and *where*; the simulation
//! assigns identities and builds the agent. Rolls are made against the
//! reserved session entity.
use glam::Vec2;

use crate::authority::AuthorityGate;
use crate::behavior::Countdown;
use crate::env::{RngOracle, Rolls, roll};
use crate::state::EntityId;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpawnerConfig {
    /// Upper bound on living agents.
    pub max_alive: usize,
    pub respawn_interval: f32,
    /// Probability in `[0, 1]` that a spawned agent is elite.
    pub elite_chance: f32,
    pub spawn_points: Vec<Vec2>,
    /// Template keys to pick from, uniformly.
    pub templates: Vec<String>,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            max_alive: 4,
            respawn_interval: 5.0,
            elite_chance: 0.1,
            spawn_points: Vec::new(),
            templates: Vec::new(),
        }
    }
}

/// What the spawner decided. The simulation turns it into an agent.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnOrder {
    pub template: String,
    pub position: Vec2,
    pub facing: Vec2,
    pub is_elite: bool,
}

#[derive(Clone, Debug)]
pub struct Spawner {
    config: SpawnerConfig,
    cooldown: Countdown,
    nonce: u64,
}

impl Spawner {
    pub fn new(config: SpawnerConfig) -> Self {
        Self {
            config,
            cooldown: Countdown::expired(),
            nonce: 0,
        }
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Advances the respawn timer and returns a spawn order when one is due.
    ///
    /// Only the instance authoritative for the session spawns. At most one
    /// agent is spawned per call, and never while `alive` is at the cap.
    pub fn tick(
        &mut self,
        dt: f32,
        alive: usize,
        authority: &dyn AuthorityGate,
        rng: &dyn RngOracle,
        session_seed: u64,
    ) -> Option<SpawnOrder> {
        if !authority.is_authoritative(EntityId::SESSION) {
            return None;
        }
        if !self.cooldown.tick(dt) || alive >= self.config.max_alive {
            return None;
        }
        if self.config.spawn_points.is_empty() || self.config.templates.is_empty() {
            return None;
        }

        let mut rolls = Rolls::new(rng, session_seed, EntityId::SESSION, &mut self.nonce);
        let position = pick(&self.config.spawn_points, rolls.unit(roll::SPAWN_POINT));
        let template = pick(&self.config.templates, rolls.unit(roll::TEMPLATE)).clone();
        // Rolled once here; the flag travels in the spawn payload.
        let is_elite = rolls.unit(roll::ELITE) < self.config.elite_chance;
        let facing = Vec2::from_angle(rolls.unit(roll::ROAM_BEARING) * std::f32::consts::TAU);

        self.cooldown.reset(self.config.respawn_interval);
        tracing::info!(
            target: "arena::spawner",
            template = %template,
            x = position.x,
            y = position.y,
            elite = is_elite,
            alive,
            "spawn due"
        );

        Some(SpawnOrder {
            template,
            position: *position,
            facing,
            is_elite,
        })
    }
}

/// Element at `unit` in `[0, 1)` along the slice. The slice is non-empty.
fn pick<T>(items: &[T], unit: f32) -> &T {
    let index = ((unit * items.len() as f32) as usize).min(items.len() - 1);
    &items[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::SessionAuthority;
    use crate::env::PcgRng;

    fn config() -> SpawnerConfig {
        SpawnerConfig {
            max_alive: 2,
            respawn_interval: 1.0,
            elite_chance: 0.5,
            spawn_points: vec![Vec2::new(1.0, 1.0), Vec2::new(-1.0, 1.0)],
            templates: vec!["grunt".into(), "brute".into()],
        }
    }

    #[test]
    fn first_spawn_is_immediate_then_waits_for_the_interval() {
        let authority = SessionAuthority::coordinator();
        let mut spawner = Spawner::new(config());

        assert!(spawner.tick(0.1, 0, &authority, &PcgRng, 7).is_some());
        assert!(spawner.tick(0.5, 1, &authority, &PcgRng, 7).is_none());
        assert!(spawner.tick(0.5, 1, &authority, &PcgRng, 7).is_some());
    }

    #[test]
    fn never_exceeds_max_alive() {
        let authority = SessionAuthority::coordinator();
        let mut spawner = Spawner::new(config());

        assert!(spawner.tick(0.1, 2, &authority, &PcgRng, 7).is_none());
        assert!(spawner.tick(5.0, 3, &authority, &PcgRng, 7).is_none());
    }

    #[test]
    fn peers_never_spawn() {
        let authority = SessionAuthority::peer();
        let mut spawner = Spawner::new(config());

        assert!(spawner.tick(10.0, 0, &authority, &PcgRng, 7).is_none());
    }

    #[test]
    fn orders_come_from_the_configured_pools() {
        let authority = SessionAuthority::coordinator();
        let mut spawner = Spawner::new(SpawnerConfig {
            max_alive: usize::MAX,
            respawn_interval: 0.0,
            ..config()
        });

        let mut elites = 0;
        for _ in 0..200 {
            let order = spawner.tick(0.1, 0, &authority, &PcgRng, 7).unwrap();
            assert!(spawner.config().spawn_points.contains(&order.position));
            assert!(spawner.config().templates.contains(&order.template));
            assert!((order.facing.length() - 1.0).abs() < 1e-5);
            elites += usize::from(order.is_elite);
        }
        assert!(elites > 0 && elites < 200);
    }

    #[test]
    fn empty_pools_spawn_nothing() {
        let authority = SessionAuthority::coordinator();
        let mut spawner = Spawner::new(SpawnerConfig::default());

        assert!(spawner.tick(1.0, 0, &authority, &PcgRng, 7).is_none());
    }
}
