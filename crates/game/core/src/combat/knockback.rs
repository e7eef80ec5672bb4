//! Knockback direction and the damping ramp.
use std::f32::consts::TAU;

use glam::Vec2;

/// Source and target closer than this are treated as coincident.
pub const DEGENERATE_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KnockbackDirection {
    /// Unit vector from source to target.
    pub direction: Vec2,
    /// True when the positions coincided and `direction` came from the
    /// fallback roll.
    pub degenerate: bool,
}

/// Unit direction pushing `target` away from `source`.
///
/// When both positions coincide the direction is taken from
/// `fallback_unit`, a value in `[0, 1)` mapped onto a full turn. The result is
/// always finite and of unit length.
pub fn knockback_direction(source: Vec2, target: Vec2, fallback_unit: f32) -> KnockbackDirection {
    let delta = target - source;
    let distance = delta.length();

    if distance.is_finite() && distance > DEGENERATE_EPSILON {
        return KnockbackDirection {
            direction: delta / distance,
            degenerate: false,
        };
    }

    let angle = if fallback_unit.is_finite() {
        fallback_unit * TAU
    } else {
        0.0
    };
    KnockbackDirection {
        direction: Vec2::from_angle(angle),
        degenerate: true,
    }
}

/// Velocity ramp that starts at an impulse and decays linearly to zero.
///
/// A new impulse replaces the running ramp; ramps never stack.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Knockback {
    initial: Vec2,
    duration: f32,
    elapsed: f32,
    active: bool,
}

impl Knockback {
    /// Starts (or restarts) the ramp with `impulse` over `duration` seconds.
    pub fn start(&mut self, impulse: Vec2, duration: f32) {
        if !duration.is_finite() || duration <= 0.0 || !impulse.is_finite() {
            self.cancel();
            return;
        }
        *self = Self {
            initial: impulse,
            duration,
            elapsed: 0.0,
            active: true,
        };
    }

    /// Velocity for the step starting now, then advances the ramp by `dt`.
    ///
    /// Returns zero once the ramp has run out.
    pub fn tick(&mut self, dt: f32) -> Vec2 {
        if !self.active {
            return Vec2::ZERO;
        }
        let velocity = self.velocity();
        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.duration {
            self.active = false;
        }
        velocity
    }

    /// Current ramp velocity without advancing it.
    pub fn velocity(&self) -> Vec2 {
        if !self.active {
            return Vec2::ZERO;
        }
        self.initial * (1.0 - self.elapsed / self.duration).max(0.0)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> f32 {
        if self.active {
            (self.duration - self.elapsed).max(0.0)
        } else {
            0.0
        }
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_points_away_from_source() {
        let result = knockback_direction(Vec2::ZERO, Vec2::new(3.0, 4.0), 0.0);

        assert!(!result.degenerate);
        assert!((result.direction - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn coincident_positions_fall_back_to_a_unit_direction() {
        let point = Vec2::new(2.0, -1.0);
        for fallback in [0.0, 0.25, 0.5, 0.999, f32::NAN] {
            let result = knockback_direction(point, point + Vec2::splat(1e-6), fallback);

            assert!(result.degenerate);
            assert!(result.direction.is_finite());
            assert!((result.direction.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn ramp_decays_linearly_to_zero() {
        let mut ramp = Knockback::default();
        ramp.start(Vec2::new(6.0, 0.0), 0.3);

        assert_eq!(ramp.tick(0.1), Vec2::new(6.0, 0.0));
        assert!((ramp.tick(0.1).x - 4.0).abs() < 1e-5);
        assert!((ramp.tick(0.1).x - 2.0).abs() < 1e-5);
        assert!(!ramp.is_active());
        assert_eq!(ramp.tick(0.1), Vec2::ZERO);
    }

    #[test]
    fn second_impulse_restarts_the_window() {
        let mut ramp = Knockback::default();
        ramp.start(Vec2::new(6.0, 0.0), 0.3);
        ramp.tick(0.2);

        ramp.start(Vec2::new(0.0, 4.0), 0.3);

        assert_eq!(ramp.velocity(), Vec2::new(0.0, 4.0));
        assert!((ramp.remaining() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn zero_duration_never_activates() {
        let mut ramp = Knockback::default();
        ramp.start(Vec2::X, 0.0);

        assert!(!ramp.is_active());
    }
}
