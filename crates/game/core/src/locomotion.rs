//! Waypoint following on top of the path planner.
//!
//! Locomotion owns at most one outstanding path request. Results are picked
//! up by polling on the next ticks; a result that belongs to a superseded
//! behavior loop is dropped.
use std::collections::VecDeque;

use glam::Vec2;

use crate::behavior::{BehaviorToken, TokenSource};
use crate::env::{PathFailure, PathHandle, PathPlanner, PathPoll};
use crate::state::EntityId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LocomotionStatus {
    #[default]
    Idle,
    /// Waiting for the planner with no route to follow yet.
    Planning,
    Following,
    Arrived,
    Failed(PathFailure),
}

#[derive(Clone, Copy, Debug)]
struct PendingRequest {
    handle: PathHandle,
    token: BehaviorToken,
}

/// Result of one movement step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Clone, Debug, Default)]
pub struct Locomotion {
    pending: Option<PendingRequest>,
    waypoints: VecDeque<Vec2>,
    destination: Option<Vec2>,
    status: LocomotionStatus,
}

impl Locomotion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> LocomotionStatus {
        self.status
    }

    pub fn destination(&self) -> Option<Vec2> {
        self.destination
    }

    pub fn has_arrived(&self) -> bool {
        self.status == LocomotionStatus::Arrived
    }

    pub fn has_pending_request(&self) -> bool {
        self.pending.is_some()
    }

    /// Requests a route to `to`, superseding any request still in flight.
    ///
    /// The current route, if any, keeps being followed until the new one
    /// arrives.
    pub fn request(
        &mut self,
        planner: &dyn PathPlanner,
        agent: EntityId,
        from: Vec2,
        to: Vec2,
        token: BehaviorToken,
    ) {
        self.cancel_pending(planner);
        let handle = planner.request_path(agent, from, to);
        self.pending = Some(PendingRequest { handle, token });
        self.destination = Some(to);
        self.status = if self.waypoints.is_empty() {
            LocomotionStatus::Planning
        } else {
            LocomotionStatus::Following
        };
    }

    /// Picks up the result of the outstanding request, if it has one.
    pub fn poll(&mut self, planner: &dyn PathPlanner, tokens: &TokenSource, agent: EntityId) {
        let Some(pending) = self.pending else {
            return;
        };

        let result = planner.poll_path(pending.handle);
        if matches!(result, PathPoll::Pending) {
            return;
        }
        self.pending = None;

        if !tokens.is_current(pending.token) {
            tracing::trace!(
                target: "arena::locomotion",
                agent = %agent,
                handle = pending.handle.0,
                "dropping path result for a superseded loop"
            );
            return;
        }

        match result {
            PathPoll::Pending => {}
            PathPoll::Ready(points) => {
                tracing::debug!(
                    target: "arena::locomotion",
                    agent = %agent,
                    waypoints = points.len(),
                    "path ready"
                );
                self.waypoints = points.into();
                self.status = if self.waypoints.is_empty() {
                    LocomotionStatus::Arrived
                } else {
                    LocomotionStatus::Following
                };
            }
            PathPoll::Failed(reason) => {
                tracing::debug!(
                    target: "arena::locomotion",
                    agent = %agent,
                    %reason,
                    "path request failed; halting"
                );
                self.waypoints.clear();
                self.status = LocomotionStatus::Failed(reason);
            }
        }
    }

    /// Cancels the outstanding request without dropping the current route.
    pub fn cancel_pending(&mut self, planner: &dyn PathPlanner) {
        if let Some(pending) = self.pending.take() {
            planner.cancel_path(pending.handle);
        }
    }

    /// Stops moving and forgets every route and request.
    pub fn halt(&mut self, planner: Option<&dyn PathPlanner>) {
        match planner {
            Some(planner) => self.cancel_pending(planner),
            None => self.pending = None,
        }
        self.waypoints.clear();
        self.destination = None;
        self.status = LocomotionStatus::Idle;
    }

    /// Moves along the route for `dt` seconds.
    ///
    /// Waypoints within `tolerance` count as reached. Reaching the last one
    /// switches the status to [`LocomotionStatus::Arrived`].
    pub fn advance(&mut self, position: Vec2, speed: f32, tolerance: f32, dt: f32) -> Step {
        let mut current = position;
        let mut budget = speed * dt;

        while budget > 0.0 {
            let Some(&next) = self.waypoints.front() else {
                break;
            };
            let offset = next - current;
            let distance = offset.length();

            if distance <= tolerance.max(f32::EPSILON) {
                self.waypoints.pop_front();
                continue;
            }
            if budget >= distance {
                current = next;
                budget -= distance;
                self.waypoints.pop_front();
            } else {
                current += offset / distance * budget;
                budget = 0.0;
            }
        }

        if self.waypoints.is_empty() && self.status == LocomotionStatus::Following {
            self.status = LocomotionStatus::Arrived;
        }

        let velocity = if dt > 0.0 {
            (current - position) / dt
        } else {
            Vec2::ZERO
        };
        Step {
            position: current,
            velocity,
        }
    }
}
