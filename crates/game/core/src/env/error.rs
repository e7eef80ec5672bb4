//! Collaborator access errors.

use crate::error::{ArenaError, ErrorSeverity};

/// Errors that occur when a required collaborator is absent from the
/// environment.
///
/// These are fatal for the agent being simulated: without navigation, path
/// planning, physics queries, or the player registry it cannot act.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("navigation oracle not available")]
    NavigationNotAvailable,

    #[error("path planner not available")]
    PlannerNotAvailable,

    #[error("physics oracle not available")]
    PhysicsNotAvailable,

    #[error("player registry not available")]
    PlayersNotAvailable,
}

impl ArenaError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NavigationNotAvailable => "ORACLE_NAVIGATION_NOT_AVAILABLE",
            Self::PlannerNotAvailable => "ORACLE_PLANNER_NOT_AVAILABLE",
            Self::PhysicsNotAvailable => "ORACLE_PHYSICS_NOT_AVAILABLE",
            Self::PlayersNotAvailable => "ORACLE_PLAYERS_NOT_AVAILABLE",
        }
    }
}
