//! Chasing loop: head for the target and keep re-aiming at its latest position.
use super::timer::{BehaviorToken, Countdown};
use super::{LoopContext, LoopSignal};
use crate::locomotion::Locomotion;
use crate::state::EntityId;

#[derive(Clone, Debug)]
pub struct ChaseLoop {
    token: BehaviorToken,
    target: EntityId,
    repath: Countdown,
    started: bool,
}

impl ChaseLoop {
    pub fn new(token: BehaviorToken, target: EntityId) -> Self {
        Self {
            token,
            target,
            repath: Countdown::expired(),
            started: false,
        }
    }

    pub fn token(&self) -> BehaviorToken {
        self.token
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Requests a path on entry, then every `chase_repath_interval`.
    ///
    /// A repath that falls due while the previous request is still being
    /// planned waits for that result instead of cancelling it, so a planner
    /// slower than the cadence still delivers routes.
    ///
    /// Returns [`LoopSignal::TargetLost`] as soon as the target no longer
    /// resolves.
    pub fn step(&mut self, cx: &LoopContext<'_>, locomotion: &mut Locomotion) -> LoopSignal {
        let Some(target) = cx.collaborators.players.resolve(self.target) else {
            return LoopSignal::TargetLost;
        };

        let due = !self.started || self.repath.tick(cx.dt);
        if !due || locomotion.has_pending_request() {
            return LoopSignal::Continue;
        }

        self.started = true;
        self.repath.reset(cx.config.chase_repath_interval);
        locomotion.request(
            cx.collaborators.planner,
            cx.agent,
            cx.position,
            target.position,
            self.token,
        );
        LoopSignal::Continue
    }
}
