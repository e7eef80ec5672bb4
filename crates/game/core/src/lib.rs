//! Deterministic agent simulation shared by every instance of a session.
//!
//! `arena-core` defines the canonical rules for hostile agents (sensing, the
//! Roaming/Chasing state machine, combat and knockback) together with the
//! replication event model that keeps mirrors in step with the authority.
//! All mutation of an agent flows through [`agent::Agent`], driven by the
//! [`simulation::Simulation`] loop; collaborators are passed in through
//! [`env::AgentEnv`].
pub mod agent;
pub mod authority;
pub mod behavior;
pub mod combat;
pub mod config;
pub mod env;
pub mod error;
pub mod locomotion;
pub mod replication;
pub mod sensor;
pub mod simulation;
pub mod spawner;
pub mod state;

#[cfg(test)]
mod testing;

pub use agent::{Agent, DamageIntake, ELITE_PREFIX, IntakeRejection, Lifecycle};
pub use authority::{AuthorityGate, Connectivity, SessionAuthority, SessionRole};
pub use behavior::{AgentStateMachine, Transition, TransitionCause};
pub use combat::{DamageOutcome, Knockback};
pub use config::AgentConfig;
pub use env::{
    AgentEnv, Collaborators, LayerMask, NavigationOracle, OracleError, PathFailure, PathHandle,
    PathPlanner, PathPoll, PcgRng, PhysicsOracle, PlayerRegistry, PlayerView, RayHit, RngOracle,
};
pub use error::{ArenaError, ConfigurationError, ErrorSeverity};
pub use replication::{
    DamageEvent, DamageRequest, EventKind, KnockbackEvent, ReplicatedEvent, SpawnPayload,
    Versioned,
};
pub use sensor::{Acquisition, ChaseVerdict, LossReason};
pub use simulation::{
    FIRST_AGENT_ID, ReplicationOutcome, Simulation, SpawnError, TOMBSTONE_RETENTION_SECS, TickReport,
};
pub use spawner::{SpawnOrder, Spawner, SpawnerConfig};
pub use state::{AgentSnapshot, AgentState, EntityId, Health, SimClock, TickContext};
