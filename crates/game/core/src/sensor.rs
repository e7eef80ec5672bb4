//! Target acquisition: radius scan, field of view, line of sight.
//!
//! Every query re-resolves players through the registry; a sensor never
//! keeps a player reference between calls.
use glam::Vec2;

use crate::env::{LayerMask, PhysicsOracle, PlayerRegistry, PlayerView};
use crate::state::EntityId;

/// Whether `target` lies inside the cone of `fov_degrees` centred on
/// `facing`.
///
/// A target on top of the observer, or an observer without a facing, counts
/// as visible.
pub fn within_field_of_view(origin: Vec2, facing: Vec2, target: Vec2, fov_degrees: f32) -> bool {
    if fov_degrees >= 360.0 {
        return true;
    }
    let (Some(facing), Some(bearing)) = (facing.try_normalize(), (target - origin).try_normalize())
    else {
        return true;
    };
    let angle = facing.dot(bearing).clamp(-1.0, 1.0).acos().to_degrees();
    angle <= fov_degrees * 0.5
}

/// Unobstructed straight segment against the obstacle layer.
pub fn has_line_of_sight(physics: &dyn PhysicsOracle, from: Vec2, to: Vec2) -> bool {
    physics.raycast(from, to, LayerMask::OBSTACLES).is_none()
}

/// Nearest living player within `radius` of `origin`.
///
/// Ties are broken by identity so every instance picks the same candidate.
pub fn nearest_living_player(
    physics: &dyn PhysicsOracle,
    players: &dyn PlayerRegistry,
    origin: Vec2,
    radius: f32,
) -> Option<PlayerView> {
    physics
        .overlap_circle(origin, radius, LayerMask::PLAYERS)
        .into_iter()
        .filter_map(|id| players.resolve(id))
        .filter(|player| player.alive && player.position.distance(origin) <= radius)
        .min_by(|a, b| {
            a.position
                .distance_squared(origin)
                .total_cmp(&b.position.distance_squared(origin))
                .then(a.id.cmp(&b.id))
        })
}

/// Outcome of a passive scan while roaming.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Acquisition {
    /// No living player in range.
    None,
    /// Nearest player passed both the FOV and the LOS gate.
    Spotted(PlayerView),
    OutsideFov(EntityId),
    Obstructed(EntityId),
}

/// Passive acquisition: the nearest in-range player must be inside the field
/// of view *and* in line of sight.
pub fn scan_for_target(
    physics: &dyn PhysicsOracle,
    players: &dyn PlayerRegistry,
    origin: Vec2,
    facing: Vec2,
    radius: f32,
    fov_degrees: f32,
) -> Acquisition {
    let Some(candidate) = nearest_living_player(physics, players, origin, radius) else {
        return Acquisition::None;
    };
    if !within_field_of_view(origin, facing, candidate.position, fov_degrees) {
        return Acquisition::OutsideFov(candidate.id);
    }
    if !has_line_of_sight(physics, origin, candidate.position) {
        return Acquisition::Obstructed(candidate.id);
    }
    Acquisition::Spotted(candidate)
}

/// Why a chase ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LossReason {
    /// No target, or the target no longer resolves.
    TargetMissing,
    TargetDead,
    OutOfRange,
    SightBlocked,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChaseVerdict {
    Continue(PlayerView),
    Lost(LossReason),
}

/// Chase continuation check. Any single failing condition ends the chase.
pub fn evaluate_chase(
    physics: &dyn PhysicsOracle,
    players: &dyn PlayerRegistry,
    origin: Vec2,
    target: Option<EntityId>,
    radius: f32,
) -> ChaseVerdict {
    let Some(player) = target.and_then(|id| players.resolve(id)) else {
        return ChaseVerdict::Lost(LossReason::TargetMissing);
    };
    if !player.alive {
        return ChaseVerdict::Lost(LossReason::TargetDead);
    }
    if player.position.distance(origin) > radius {
        return ChaseVerdict::Lost(LossReason::OutOfRange);
    }
    if !has_line_of_sight(physics, origin, player.position) {
        return ChaseVerdict::Lost(LossReason::SightBlocked);
    }
    ChaseVerdict::Continue(player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWorld;

    fn bearing(degrees: f32) -> Vec2 {
        Vec2::from_angle(degrees.to_radians()) * 5.0
    }

    #[test]
    fn field_of_view_is_a_half_angle_test() {
        for (degrees, visible) in [(0.0, true), (50.0, true), (-59.0, true), (61.0, false), (180.0, false)] {
            assert_eq!(
                within_field_of_view(Vec2::ZERO, Vec2::X, bearing(degrees), 120.0),
                visible,
                "bearing {degrees}"
            );
        }
        assert!(within_field_of_view(Vec2::ZERO, Vec2::X, bearing(180.0), 360.0));
        assert!(within_field_of_view(Vec2::ZERO, Vec2::ZERO, bearing(180.0), 10.0));
    }

    #[test]
    fn spotted_requires_fov_and_line_of_sight() {
        let world = FakeWorld::new();
        let player = world.put_player(1, Vec2::new(4.0, 0.0));

        let scan = |facing| scan_for_target(&world, &world, Vec2::ZERO, facing, 8.0, 120.0);

        assert!(matches!(scan(Vec2::X), Acquisition::Spotted(view) if view.id == player));
        assert_eq!(scan(-Vec2::X), Acquisition::OutsideFov(player));

        world.add_blocker(Vec2::new(2.0, 0.0), 0.5);
        assert_eq!(scan(Vec2::X), Acquisition::Obstructed(player));
    }

    #[test]
    fn scan_ignores_dead_and_distant_players() {
        let world = FakeWorld::new();
        let dead = world.put_player(1, Vec2::new(1.0, 0.0));
        world.kill_player(dead);
        world.put_player(2, Vec2::new(9.0, 0.0));

        assert_eq!(
            scan_for_target(&world, &world, Vec2::ZERO, Vec2::X, 8.0, 120.0),
            Acquisition::None
        );
    }

    #[test]
    fn nearest_candidate_wins() {
        let world = FakeWorld::new();
        world.put_player(1, Vec2::new(6.0, 0.0));
        let near = world.put_player(2, Vec2::new(0.0, 3.0));

        let found = nearest_living_player(&world, &world, Vec2::ZERO, 8.0);
        assert_eq!(found.map(|p| p.id), Some(near));
    }

    #[test]
    fn each_exit_condition_ends_the_chase_on_its_own() {
        let origin = Vec2::ZERO;

        let world = FakeWorld::new();
        let target = world.put_player(1, Vec2::new(3.0, 0.0));
        assert!(matches!(
            evaluate_chase(&world, &world, origin, Some(target), 8.0),
            ChaseVerdict::Continue(_)
        ));

        assert_eq!(
            evaluate_chase(&world, &world, origin, None, 8.0),
            ChaseVerdict::Lost(LossReason::TargetMissing)
        );

        world.remove_player(target);
        assert_eq!(
            evaluate_chase(&world, &world, origin, Some(target), 8.0),
            ChaseVerdict::Lost(LossReason::TargetMissing)
        );

        let world = FakeWorld::new();
        let target = world.put_player(1, Vec2::new(3.0, 0.0));
        world.kill_player(target);
        assert_eq!(
            evaluate_chase(&world, &world, origin, Some(target), 8.0),
            ChaseVerdict::Lost(LossReason::TargetDead)
        );

        let world = FakeWorld::new();
        let target = world.put_player(1, Vec2::new(8.5, 0.0));
        assert_eq!(
            evaluate_chase(&world, &world, origin, Some(target), 8.0),
            ChaseVerdict::Lost(LossReason::OutOfRange)
        );

        let world = FakeWorld::new();
        let target = world.put_player(1, Vec2::new(3.0, 0.0));
        world.add_blocker(Vec2::new(1.5, 0.0), 0.25);
        assert_eq!(
            evaluate_chase(&world, &world, origin, Some(target), 8.0),
            ChaseVerdict::Lost(LossReason::SightBlocked)
        );
    }
}
