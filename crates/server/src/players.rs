//! Scripted players for headless sessions.
//!
//! Players wander between random open points and shoot the nearest agent in
//! range. Each player reports hits through the instance it is attached to,
//! so hits made on a mirror travel to the coordinator like real ones.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use arena_core::{EntityId, NavigationOracle};
use arena_runtime::{NavGrid, PlayerDirectory, RuntimeHandle};

const PLAYER_SPEED: f32 = 3.0;
const PLAYER_HEALTH: f32 = 200.0;
const WEAPON_RANGE: f32 = 6.0;
const WEAPON_DAMAGE: f32 = 12.0;
const WEAPON_COOLDOWN: f32 = 0.8;

struct Scripted {
    id: EntityId,
    waypoint: Option<Vec2>,
    cooldown: f32,
    /// Index of the instance this player reports through.
    instance: usize,
}

pub struct ScriptedPlayers {
    directory: Arc<PlayerDirectory>,
    grid: Arc<NavGrid>,
    players: Vec<Scripted>,
    rng: StdRng,
}

impl ScriptedPlayers {
    /// Places `count` players, cycling through `starts`.
    pub fn new(
        directory: Arc<PlayerDirectory>,
        grid: Arc<NavGrid>,
        starts: &[Vec2],
        count: usize,
        instances: usize,
        seed: u64,
    ) -> Self {
        let fallback = grid.layout().extent() * 0.5;
        let players = (0..count)
            .map(|i| {
                let id = EntityId(i as u32 + 1);
                let start = starts.get(i % starts.len().max(1)).copied().unwrap_or(fallback);
                directory.insert(id, start, PLAYER_HEALTH);
                Scripted {
                    id,
                    waypoint: None,
                    cooldown: 0.0,
                    instance: i % instances.max(1),
                }
            })
            .collect();

        Self {
            directory,
            grid,
            players,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Advances every living player by `dt`.
    pub async fn step(&mut self, dt: Duration, handles: &[RuntimeHandle]) -> Result<()> {
        let dt = dt.as_secs_f32();
        for index in 0..self.players.len() {
            let id = self.players[index].id;
            let Some(record) = self.directory.get(id) else {
                continue;
            };
            if !record.is_alive() {
                continue;
            }

            let position = self.walk(index, record.position, dt);

            let player = &mut self.players[index];
            player.cooldown = (player.cooldown - dt).max(0.0);
            if player.cooldown > 0.0 {
                continue;
            }
            let Some(handle) = handles.get(player.instance).or_else(|| handles.first()) else {
                continue;
            };

            let target = handle
                .agents()
                .await?
                .into_iter()
                .filter(|agent| !agent.destroyed)
                .map(|agent| (agent.position.distance(position), agent.id))
                .filter(|(distance, _)| *distance <= WEAPON_RANGE)
                .min_by(|a, b| a.0.total_cmp(&b.0));

            if let Some((distance, agent)) = target {
                let intake = handle.apply_damage(agent, WEAPON_DAMAGE, id).await?;
                tracing::debug!(
                    target: "arena::players",
                    player = %id,
                    agent = %agent,
                    distance,
                    peer = %handle.peer(),
                    intake = ?intake,
                    "player fired"
                );
                self.players[index].cooldown = WEAPON_COOLDOWN;
            }
        }
        Ok(())
    }

    fn walk(&mut self, index: usize, position: Vec2, dt: f32) -> Vec2 {
        let waypoint = match self.players[index].waypoint {
            Some(waypoint) if waypoint.distance(position) > 0.1 => waypoint,
            _ => match self.pick_waypoint(position) {
                Some(waypoint) => waypoint,
                None => return position,
            },
        };
        self.players[index].waypoint = Some(waypoint);

        let next = position + (waypoint - position).clamp_length_max(PLAYER_SPEED * dt);
        if self.grid.is_walkable(next) {
            self.directory.move_to(self.players[index].id, next);
            next
        } else {
            self.players[index].waypoint = None;
            position
        }
    }

    fn pick_waypoint(&mut self, from: Vec2) -> Option<Vec2> {
        let extent = self.grid.layout().extent();
        let candidate = Vec2::new(
            self.rng.gen_range(0.0..extent.x),
            self.rng.gen_range(0.0..extent.y),
        );
        let waypoint = self.grid.nearest_walkable_node(candidate)?;
        self.grid.segment_clear(from, waypoint).then_some(waypoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_content::ArenaLayout;

    fn grid() -> Arc<NavGrid> {
        Arc::new(NavGrid::new(ArenaLayout {
            name: "open".into(),
            cell_size: 1.0,
            rows: vec!["......".into(); 6],
            spawn_points: vec![],
            player_starts: vec![(1.5, 1.5)],
        }))
    }

    #[tokio::test]
    async fn players_stay_on_open_ground() {
        let directory = Arc::new(PlayerDirectory::new());
        let grid = grid();
        let mut players = ScriptedPlayers::new(
            directory.clone(),
            grid.clone(),
            &[Vec2::new(1.5, 1.5)],
            2,
            1,
            42,
        );
        assert_eq!(players.len(), 2);

        for _ in 0..100 {
            players.step(Duration::from_millis(50), &[]).await.unwrap();
        }
        for record in directory.players() {
            assert!(grid.is_walkable(record.position));
        }
    }
}
