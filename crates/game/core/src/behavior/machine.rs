use std::fmt;

use crate::sensor::LossReason;
use crate::state::{AgentState, EntityId};

use super::chase::ChaseLoop;
use super::roam::RoamLoop;
use super::timer::{BehaviorToken, TokenSource};

/// What triggered a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionCause {
    /// Passive scan passed the FOV and LOS gates.
    Spotted,
    /// Hit while roaming.
    Damaged,
    /// Hit by a different attacker while chasing.
    Retarget,
    Lost(LossReason),
    /// Authority moved to this instance and state was re-derived.
    AuthorityResumed,
}

impl fmt::Display for TransitionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spotted => f.write_str("spotted"),
            Self::Damaged => f.write_str("damaged"),
            Self::Retarget => f.write_str("retarget"),
            Self::Lost(reason) => write!(f, "lost({reason})"),
            Self::AuthorityResumed => f.write_str("authority_resumed"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: AgentState,
    pub to: AgentState,
    pub target: Option<EntityId>,
    pub cause: TransitionCause,
}

/// The single active behavior loop of an agent.
#[derive(Clone, Debug)]
pub enum BehaviorLoop {
    Roam(RoamLoop),
    Chase(ChaseLoop),
}

impl BehaviorLoop {
    pub fn token(&self) -> BehaviorToken {
        match self {
            Self::Roam(roam) => roam.token(),
            Self::Chase(chase) => chase.token(),
        }
    }
}

/// Roaming/Chasing state machine.
///
/// Every entry into a state issues a fresh token and replaces the active
/// loop, so at most one loop runs and the waits of the previous one become
/// stale.
#[derive(Clone, Debug, Default)]
pub struct AgentStateMachine {
    state: AgentState,
    target: Option<EntityId>,
    tokens: TokenSource,
    active: Option<BehaviorLoop>,
}

impl AgentStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn tokens(&self) -> &TokenSource {
        &self.tokens
    }

    pub fn active(&self) -> Option<&BehaviorLoop> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut BehaviorLoop> {
        self.active.as_mut()
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a fresh roam loop. Returns the transition if the state changed.
    pub fn enter_roaming(&mut self, cause: TransitionCause) -> Option<Transition> {
        let from = self.state;
        let previous_target = self.target;

        let token = self.tokens.issue();
        self.state = AgentState::Roaming;
        self.target = None;
        self.active = Some(BehaviorLoop::Roam(RoamLoop::new(token)));

        (from != AgentState::Roaming || previous_target.is_some()).then_some(Transition {
            from,
            to: AgentState::Roaming,
            target: None,
            cause,
        })
    }

    /// Starts a fresh chase loop on `target`.
    ///
    /// Chasing the current target with a running loop is a no-op.
    pub fn enter_chasing(&mut self, target: EntityId, cause: TransitionCause) -> Option<Transition> {
        if self.is_chasing(target) {
            return None;
        }
        let from = self.state;
        let previous_target = self.target;

        let token = self.tokens.issue();
        self.state = AgentState::Chasing;
        self.target = Some(target);
        self.active = Some(BehaviorLoop::Chase(ChaseLoop::new(token, target)));

        (from != AgentState::Chasing || previous_target != Some(target)).then_some(Transition {
            from,
            to: AgentState::Chasing,
            target: Some(target),
            cause,
        })
    }

    pub fn is_chasing(&self, target: EntityId) -> bool {
        self.state == AgentState::Chasing
            && self.target == Some(target)
            && matches!(&self.active, Some(BehaviorLoop::Chase(chase)) if chase.target() == target)
    }

    /// Stops the active loop and stales every outstanding wait. State and
    /// target are kept as last known values.
    pub fn suspend(&mut self) {
        self.tokens.invalidate();
        self.active = None;
    }

    /// Overwrites state and target without starting a loop.
    ///
    /// Used to seed the machine with replicated values before resuming
    /// authority.
    pub fn adopt(&mut self, state: AgentState, target: Option<EntityId>) {
        self.suspend();
        self.state = state;
        self.target = match state {
            AgentState::Roaming => None,
            AgentState::Chasing => target,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_in_roaming() {
        let machine = AgentStateMachine::new();

        assert_eq!(machine.state(), AgentState::Roaming);
        assert!(!machine.is_running());
    }

    #[test]
    fn chasing_the_same_target_is_a_no_op() {
        let mut machine = AgentStateMachine::new();
        machine.enter_roaming(TransitionCause::AuthorityResumed);

        let transition = machine.enter_chasing(EntityId(1), TransitionCause::Spotted);
        assert_eq!(
            transition.map(|t| (t.from, t.to)),
            Some((AgentState::Roaming, AgentState::Chasing))
        );
        let token = machine.active().map(BehaviorLoop::token);

        assert_eq!(machine.enter_chasing(EntityId(1), TransitionCause::Damaged), None);
        assert_eq!(machine.active().map(BehaviorLoop::token), token);
    }

    #[test]
    fn retarget_restarts_the_loop() {
        let mut machine = AgentStateMachine::new();
        machine.enter_chasing(EntityId(1), TransitionCause::Spotted);
        let old = machine.active().map(BehaviorLoop::token);

        let transition = machine.enter_chasing(EntityId(2), TransitionCause::Retarget);

        assert_eq!(transition.and_then(|t| t.target), Some(EntityId(2)));
        let new = machine.active().map(BehaviorLoop::token);
        assert_ne!(old, new);
        assert!(!machine.tokens().is_current(old.unwrap()));
    }

    #[test]
    fn losing_the_target_returns_to_roaming() {
        let mut machine = AgentStateMachine::new();
        machine.enter_chasing(EntityId(1), TransitionCause::Spotted);

        let transition = machine
            .enter_roaming(TransitionCause::Lost(LossReason::TargetDead))
            .unwrap();

        assert_eq!(transition.from, AgentState::Chasing);
        assert_eq!(machine.target(), None);
        assert_eq!(transition.cause.to_string(), "lost(target_dead)");
    }

    #[test]
    fn re_entering_roaming_is_silent_but_fresh() {
        let mut machine = AgentStateMachine::new();
        machine.enter_roaming(TransitionCause::AuthorityResumed);
        let old = machine.active().map(BehaviorLoop::token);

        assert_eq!(machine.enter_roaming(TransitionCause::AuthorityResumed), None);
        assert_ne!(machine.active().map(BehaviorLoop::token), old);
    }
}
