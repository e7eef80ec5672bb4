//! Roaming loop: pick a reachable point, travel, pause, idle, repeat.
use std::f32::consts::TAU;

use glam::Vec2;

use super::timer::{BehaviorToken, Countdown};
use super::{LoopContext, LoopSignal};
use crate::env::{NavigationOracle, Rolls, roll};
use crate::locomotion::{Locomotion, LocomotionStatus};

/// Random point at a random bearing, `[min, max]` away from `origin`.
pub fn roam_candidate(origin: Vec2, rolls: &mut Rolls<'_>, min: f32, max: f32) -> Vec2 {
    let bearing = rolls.unit(roll::ROAM_BEARING) * TAU;
    let radius = rolls.range(roll::ROAM_RADIUS, min, max);
    origin + Vec2::from_angle(bearing) * radius
}

/// Snaps candidates to walkable nodes until one is far enough away.
///
/// A snapped node closer than `min` to `origin` is rejected. Returns `None`
/// once `attempts` candidates have been rejected.
pub fn find_reachable_point(
    navigation: &dyn NavigationOracle,
    rolls: &mut Rolls<'_>,
    origin: Vec2,
    min: f32,
    max: f32,
    attempts: u32,
) -> Option<Vec2> {
    (0..attempts).find_map(|_| {
        let candidate = roam_candidate(origin, rolls, min, max);
        navigation
            .nearest_walkable_node(candidate)
            .filter(|node| node.distance(origin) >= min)
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RoamPhase {
    SelectDestination,
    /// Every candidate was rejected; holding position.
    Backoff(Countdown),
    Travelling {
        destination: Vec2,
        deadline: Countdown,
    },
    Pausing(Countdown),
    Idling(Countdown),
}

#[derive(Clone, Debug)]
pub struct RoamLoop {
    token: BehaviorToken,
    phase: RoamPhase,
}

impl RoamLoop {
    pub fn new(token: BehaviorToken) -> Self {
        Self {
            token,
            phase: RoamPhase::SelectDestination,
        }
    }

    pub fn token(&self) -> BehaviorToken {
        self.token
    }

    pub fn phase(&self) -> RoamPhase {
        self.phase
    }

    pub fn step(
        &mut self,
        cx: &LoopContext<'_>,
        rolls: &mut Rolls<'_>,
        locomotion: &mut Locomotion,
    ) -> LoopSignal {
        let config = cx.config;
        let planner = cx.collaborators.planner;

        self.phase = match self.phase {
            RoamPhase::SelectDestination => {
                match find_reachable_point(
                    cx.collaborators.navigation,
                    rolls,
                    cx.position,
                    config.min_roam_distance,
                    config.max_roam_distance,
                    config.max_roam_attempts,
                ) {
                    Some(destination) => {
                        locomotion.request(planner, cx.agent, cx.position, destination, self.token);
                        tracing::debug!(
                            target: "arena::behavior",
                            agent = %cx.agent,
                            x = destination.x,
                            y = destination.y,
                            "roaming to new destination"
                        );
                        RoamPhase::Travelling {
                            destination,
                            deadline: Countdown::new(config.roam_travel_timeout),
                        }
                    }
                    None => {
                        tracing::debug!(
                            target: "arena::behavior",
                            agent = %cx.agent,
                            attempts = config.max_roam_attempts,
                            "no reachable roam point; holding position"
                        );
                        locomotion.halt(Some(planner));
                        RoamPhase::Backoff(Countdown::new(config.roam_retry_delay))
                    }
                }
            }
            RoamPhase::Backoff(mut delay) => {
                if delay.tick(cx.dt) {
                    RoamPhase::SelectDestination
                } else {
                    RoamPhase::Backoff(delay)
                }
            }
            RoamPhase::Travelling {
                destination,
                mut deadline,
            } => {
                let timed_out = deadline.tick(cx.dt);
                match locomotion.status() {
                    LocomotionStatus::Arrived => {
                        locomotion.halt(Some(planner));
                        Self::pause(rolls, cx)
                    }
                    LocomotionStatus::Failed(reason) => {
                        tracing::debug!(
                            target: "arena::behavior",
                            agent = %cx.agent,
                            %reason,
                            "roam path failed"
                        );
                        locomotion.halt(Some(planner));
                        Self::pause(rolls, cx)
                    }
                    _ if timed_out => {
                        tracing::warn!(
                            target: "arena::behavior",
                            agent = %cx.agent,
                            timeout = config.roam_travel_timeout,
                            "roam destination not reached in time; halting"
                        );
                        locomotion.halt(Some(planner));
                        Self::pause(rolls, cx)
                    }
                    _ => RoamPhase::Travelling {
                        destination,
                        deadline,
                    },
                }
            }
            RoamPhase::Pausing(mut pause) => {
                if pause.tick(cx.dt) {
                    let interval = rolls.range(
                        roll::ROAM_INTERVAL,
                        config.min_roaming_interval,
                        config.max_roaming_interval,
                    );
                    RoamPhase::Idling(Countdown::new(interval))
                } else {
                    RoamPhase::Pausing(pause)
                }
            }
            RoamPhase::Idling(mut idle) => {
                if idle.tick(cx.dt) {
                    RoamPhase::SelectDestination
                } else {
                    RoamPhase::Idling(idle)
                }
            }
        };

        LoopSignal::Continue
    }

    fn pause(rolls: &mut Rolls<'_>, cx: &LoopContext<'_>) -> RoamPhase {
        let pause = rolls.range(
            roll::ROAM_PAUSE,
            cx.config.min_roaming_pause,
            cx.config.max_roaming_pause,
        );
        RoamPhase::Pausing(Countdown::new(pause))
    }
}
