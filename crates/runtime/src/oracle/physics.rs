//! Overlap and ray queries against arena walls and players.
use std::sync::Arc;

use glam::Vec2;

use arena_content::ArenaLayout;
use arena_core::{EntityId, LayerMask, PhysicsOracle, RayHit};

use super::players::PlayerDirectory;

/// Collision radius of a player body.
pub const PLAYER_RADIUS: f32 = 0.4;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Aabb {
    min: Vec2,
    max: Vec2,
}

pub struct PhysicsWorld {
    walls: Vec<Aabb>,
    players: Arc<PlayerDirectory>,
}

impl PhysicsWorld {
    /// Every blocked cell of the layout becomes a wall.
    pub fn from_layout(layout: &ArenaLayout, players: Arc<PlayerDirectory>) -> Self {
        let size = Vec2::splat(layout.cell_size);
        let walls = layout
            .blocked_cells()
            .map(|(col, row)| {
                let min = Vec2::new(col as f32, row as f32) * layout.cell_size;
                Aabb {
                    min,
                    max: min + size,
                }
            })
            .collect();
        Self { walls, players }
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }
}

impl PhysicsOracle for PhysicsWorld {
    /// Only players are dynamic; overlaps on other layers report nothing.
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<EntityId> {
        if !mask.contains(LayerMask::PLAYERS) {
            return Vec::new();
        }
        self.players.within(center, radius + PLAYER_RADIUS)
    }

    fn raycast(&self, from: Vec2, to: Vec2, mask: LayerMask) -> Option<RayHit> {
        let segment = to - from;
        let mut best: Option<RayHit> = None;
        let mut consider = |t: f32, entity| {
            let point = from + segment * t;
            let distance = segment.length() * t;
            if best.is_none_or(|hit| distance < hit.distance) {
                best = Some(RayHit {
                    entity,
                    point,
                    distance,
                });
            }
        };

        if mask.contains(LayerMask::OBSTACLES) {
            for wall in &self.walls {
                if let Some(t) = segment_aabb_enter_t(from, to, wall.min, wall.max) {
                    consider(t, None);
                }
            }
        }
        if mask.contains(LayerMask::PLAYERS) {
            for player in self.players.players() {
                if let Some(t) = segment_circle_enter_t(from, to, player.position, PLAYER_RADIUS) {
                    consider(t, Some(player.id));
                }
            }
        }
        best
    }
}

/// Parametric `t` in `[0, 1]` at which the segment first enters the box.
fn segment_aabb_enter_t(p0: Vec2, p1: Vec2, min: Vec2, max: Vec2) -> Option<f32> {
    let d = p1 - p0;
    let mut tmin = 0.0f32;
    let mut tmax = 1.0f32;
    for i in 0..2 {
        let s = p0[i];
        let dir = d[i];
        if dir.abs() < 1e-6 {
            if s < min[i] || s > max[i] {
                return None;
            }
        } else {
            let inv = 1.0 / dir;
            let mut t0 = (min[i] - s) * inv;
            let mut t1 = (max[i] - s) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            tmin = tmin.max(t0);
            tmax = tmax.min(t1);
            if tmin > tmax {
                return None;
            }
        }
    }
    Some(tmin)
}

/// Parametric `t` of the segment point closest to the circle, if that point
/// lies inside it.
fn segment_circle_enter_t(p0: Vec2, p1: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let ab = p1 - p0;
    let len2 = ab.length_squared();
    let t = if len2 <= 1e-12 {
        0.0
    } else {
        ((center - p0).dot(ab) / len2).clamp(0.0, 1.0)
    };
    let closest = p0 + ab * t;
    (closest.distance_squared(center) <= radius * radius).then_some(t)
}
