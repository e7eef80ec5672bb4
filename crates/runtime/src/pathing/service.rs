//! The asynchronous pathfinding service agents route through.
use std::sync::Arc;

use async_trait::async_trait;
use glam::Vec2;
use thiserror::Error;

use arena_core::{NavigationOracle, PathFailure};

use crate::oracle::NavGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanningError {
    #[error("no route between the requested points")]
    NoRoute,

    #[error("pathfinding request timed out")]
    Timeout,

    #[error("pathfinding service unavailable")]
    Unavailable,
}

impl PlanningError {
    /// Whether another attempt might succeed.
    pub fn is_transient(self) -> bool {
        !matches!(self, PlanningError::NoRoute)
    }
}

impl From<PlanningError> for PathFailure {
    fn from(error: PlanningError) -> Self {
        match error {
            PlanningError::NoRoute => PathFailure::NoRoute,
            PlanningError::Timeout => PathFailure::Timeout,
            PlanningError::Unavailable => PathFailure::ServiceUnavailable,
        }
    }
}

/// Computes routes between two points. Implementations may be remote.
#[async_trait]
pub trait PathfindingService: Send + Sync {
    /// Waypoints from `from` to `to`, excluding `from` and ending at the
    /// reachable destination.
    async fn find_path(&self, from: Vec2, to: Vec2) -> Result<Vec<Vec2>, PlanningError>;
}

/// Routes in a straight line across the grid, after snapping the
/// destination onto open ground.
pub struct StraightLinePathfinder {
    grid: Arc<NavGrid>,
}

impl StraightLinePathfinder {
    pub fn new(grid: Arc<NavGrid>) -> Self {
        Self { grid }
    }
}

#[async_trait]
impl PathfindingService for StraightLinePathfinder {
    async fn find_path(&self, from: Vec2, to: Vec2) -> Result<Vec<Vec2>, PlanningError> {
        let destination = self
            .grid
            .nearest_walkable_node(to)
            .ok_or(PlanningError::NoRoute)?;
        if !self.grid.segment_clear(from, destination) {
            return Err(PlanningError::NoRoute);
        }
        Ok(vec![destination])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_content::ArenaLayout;

    fn pathfinder() -> StraightLinePathfinder {
        StraightLinePathfinder::new(Arc::new(NavGrid::new(ArenaLayout {
            name: "corridor".into(),
            cell_size: 1.0,
            rows: vec!["....".into(), ".##.".into(), "....".into()],
            spawn_points: vec![],
            player_starts: vec![],
        })))
    }

    #[tokio::test]
    async fn clear_lines_route_directly() {
        let path = pathfinder()
            .find_path(Vec2::new(0.5, 0.5), Vec2::new(3.5, 0.5))
            .await
            .unwrap();
        assert_eq!(path, vec![Vec2::new(3.5, 0.5)]);
    }

    #[tokio::test]
    async fn blocked_lines_have_no_route() {
        let result = pathfinder()
            .find_path(Vec2::new(0.5, 1.5), Vec2::new(3.5, 1.5))
            .await;
        assert_eq!(result, Err(PlanningError::NoRoute));
    }

    #[test]
    fn only_missing_routes_are_final() {
        assert!(!PlanningError::NoRoute.is_transient());
        assert!(PlanningError::Timeout.is_transient());
        assert_eq!(PathFailure::from(PlanningError::Unavailable), PathFailure::ServiceUnavailable);
    }
}
