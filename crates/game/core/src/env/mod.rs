//! Traits describing the external collaborators an agent consumes.
//!
//! The pathfinding service, physics queries, and the player registry live
//! outside this crate. The [`AgentEnv`] aggregate hands them to agents
//! explicitly on every call, so no agent ever looks a collaborator up on its
//! own.
mod error;
mod navigation;
mod physics;
mod players;
mod rng;

pub use error::OracleError;
pub use navigation::{NavigationOracle, PathFailure, PathHandle, PathPlanner, PathPoll};
pub use physics::{LayerMask, PhysicsOracle, RayHit};
pub use players::{PlayerRegistry, PlayerView};
pub use rng::{PcgRng, RngOracle, Rolls, compute_seed, roll};

use crate::authority::AuthorityGate;

/// Aggregates the collaborators required by agents.
///
/// The authority gate and RNG are always present. The remaining collaborators
/// are optional at construction so that a missing one surfaces as a
/// configuration error for the agents that need it, instead of a panic.
#[derive(Clone, Copy)]
pub struct AgentEnv<'a> {
    authority: &'a dyn AuthorityGate,
    rng: &'a dyn RngOracle,
    session_seed: u64,
    navigation: Option<&'a dyn NavigationOracle>,
    planner: Option<&'a dyn PathPlanner>,
    physics: Option<&'a dyn PhysicsOracle>,
    players: Option<&'a dyn PlayerRegistry>,
}

impl<'a> AgentEnv<'a> {
    pub fn new(authority: &'a dyn AuthorityGate, rng: &'a dyn RngOracle, session_seed: u64) -> Self {
        Self {
            authority,
            rng,
            session_seed,
            navigation: None,
            planner: None,
            physics: None,
            players: None,
        }
    }

    pub fn with_all(
        authority: &'a dyn AuthorityGate,
        rng: &'a dyn RngOracle,
        session_seed: u64,
        navigation: &'a dyn NavigationOracle,
        planner: &'a dyn PathPlanner,
        physics: &'a dyn PhysicsOracle,
        players: &'a dyn PlayerRegistry,
    ) -> Self {
        Self::new(authority, rng, session_seed)
            .with_navigation(navigation)
            .with_planner(planner)
            .with_physics(physics)
            .with_players(players)
    }

    pub fn with_navigation(mut self, navigation: &'a dyn NavigationOracle) -> Self {
        self.navigation = Some(navigation);
        self
    }

    pub fn with_planner(mut self, planner: &'a dyn PathPlanner) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn with_physics(mut self, physics: &'a dyn PhysicsOracle) -> Self {
        self.physics = Some(physics);
        self
    }

    pub fn with_players(mut self, players: &'a dyn PlayerRegistry) -> Self {
        self.players = Some(players);
        self
    }

    pub fn authority(&self) -> &'a dyn AuthorityGate {
        self.authority
    }

    pub fn rng(&self) -> &'a dyn RngOracle {
        self.rng
    }

    pub fn session_seed(&self) -> u64 {
        self.session_seed
    }

    /// Returns the planner if one was provided. Teardown uses this to cancel
    /// outstanding requests even when other collaborators are missing.
    pub fn planner(&self) -> Option<&'a dyn PathPlanner> {
        self.planner
    }

    pub fn players(&self) -> Option<&'a dyn PlayerRegistry> {
        self.players
    }

    /// Resolves every collaborator an agent needs to simulate.
    ///
    /// # Errors
    ///
    /// Returns the [`OracleError`] for the first missing collaborator.
    pub fn resolve(&self) -> Result<Collaborators<'a>, OracleError> {
        Ok(Collaborators {
            navigation: self.navigation.ok_or(OracleError::NavigationNotAvailable)?,
            planner: self.planner.ok_or(OracleError::PlannerNotAvailable)?,
            physics: self.physics.ok_or(OracleError::PhysicsNotAvailable)?,
            players: self.players.ok_or(OracleError::PlayersNotAvailable)?,
            rng: self.rng,
            session_seed: self.session_seed,
        })
    }
}

/// Fully resolved collaborators for one simulation step.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub navigation: &'a dyn NavigationOracle,
    pub planner: &'a dyn PathPlanner,
    pub physics: &'a dyn PhysicsOracle,
    pub players: &'a dyn PlayerRegistry,
    pub rng: &'a dyn RngOracle,
    pub session_seed: u64,
}
