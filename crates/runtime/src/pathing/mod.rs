//! Path planning behind the agent-facing [`arena_core::PathPlanner`] seam.
mod adapter;
mod service;

pub use adapter::{PathPlanningAdapter, RetryPolicy};
pub use service::{PathfindingService, PlanningError, StraightLinePathfinder};
