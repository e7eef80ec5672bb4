//! Runtime implementations of the collaborators agents consume.
//!
//! These expose `arena-core` oracle traits and bundle them into an
//! [`OracleManager`] so the worker can lend an [`AgentEnv`] to the
//! simulation on every step. Collaborators left unset surface as agent
//! configuration errors, not panics.
mod navgrid;
mod physics;
mod players;

use std::sync::Arc;

use arena_content::ArenaLayout;
use arena_core::{AgentEnv, AuthorityGate, PcgRng};

pub use navgrid::NavGrid;
pub use physics::{PLAYER_RADIUS, PhysicsWorld};
pub use players::{PLAYER_KNOCKBACK_SECONDS, PlayerDirectory, PlayerEffect, PlayerRecord};

use crate::pathing::{PathPlanningAdapter, PathfindingService, RetryPolicy, StraightLinePathfinder};

/// Manages all oracle implementations and provides unified access
#[derive(Clone)]
pub struct OracleManager {
    pub(crate) navigation: Option<Arc<NavGrid>>,
    pub(crate) planner: Option<Arc<PathPlanningAdapter>>,
    pub(crate) physics: Option<Arc<PhysicsWorld>>,
    pub(crate) players: Arc<PlayerDirectory>,
    pub(crate) rng: PcgRng,
    pub(crate) session_seed: u64,
}

impl OracleManager {
    /// Creates a manager with only the player directory; add the rest with
    /// the `with_*` methods.
    pub fn new(players: Arc<PlayerDirectory>, session_seed: u64) -> Self {
        Self {
            navigation: None,
            planner: None,
            physics: None,
            players,
            rng: PcgRng, // PcgRng is stateless
            session_seed,
        }
    }

    /// Full set of collaborators for an arena, routing paths in straight
    /// lines over its grid.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn for_arena(
        layout: ArenaLayout,
        players: Arc<PlayerDirectory>,
        session_seed: u64,
        policy: RetryPolicy,
    ) -> Self {
        let physics = PhysicsWorld::from_layout(&layout, players.clone());
        let grid = Arc::new(NavGrid::new(layout));
        let service: Arc<dyn PathfindingService> =
            Arc::new(StraightLinePathfinder::new(grid.clone()));

        Self::new(players, session_seed)
            .with_navigation(grid)
            .with_planner(Arc::new(PathPlanningAdapter::new(service, policy)))
            .with_physics(Arc::new(physics))
    }

    pub fn with_navigation(mut self, navigation: Arc<NavGrid>) -> Self {
        self.navigation = Some(navigation);
        self
    }

    pub fn with_planner(mut self, planner: Arc<PathPlanningAdapter>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn with_physics(mut self, physics: Arc<PhysicsWorld>) -> Self {
        self.physics = Some(physics);
        self
    }

    /// Lends every configured collaborator to the simulation.
    pub fn as_agent_env<'a>(&'a self, authority: &'a dyn AuthorityGate) -> AgentEnv<'a> {
        let mut env = AgentEnv::new(authority, &self.rng, self.session_seed)
            .with_players(self.players.as_ref());
        if let Some(navigation) = &self.navigation {
            env = env.with_navigation(navigation.as_ref());
        }
        if let Some(planner) = &self.planner {
            env = env.with_planner(planner.as_ref());
        }
        if let Some(physics) = &self.physics {
            env = env.with_physics(physics.as_ref());
        }
        env
    }

    pub fn players(&self) -> &Arc<PlayerDirectory> {
        &self.players
    }

    pub fn session_seed(&self) -> u64 {
        self.session_seed
    }
}
