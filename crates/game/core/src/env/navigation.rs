use glam::Vec2;

use crate::state::EntityId;

/// Walkability queries answered by the external pathfinding service.
pub trait NavigationOracle: Send + Sync {
    /// Nearest node an agent can stand on, or `None` when the service knows
    /// no walkable node near `point`.
    fn nearest_walkable_node(&self, point: Vec2) -> Option<Vec2>;
}

/// Opaque handle for an in-flight path request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathHandle(pub u64);

/// Why a path request produced no route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PathFailure {
    /// The service answered but found no route.
    NoRoute,
    /// Every attempt exceeded the request timeout.
    Timeout,
    /// The service could not be reached or failed internally.
    ServiceUnavailable,
    /// The request was superseded or cancelled before it completed.
    Cancelled,
    /// The handle is not known to the planner.
    UnknownHandle,
}

/// Progress of a path request.
#[derive(Clone, Debug, PartialEq)]
pub enum PathPoll {
    Pending,
    Ready(Vec<Vec2>),
    Failed(PathFailure),
}

/// Asynchronous path planning as seen by the synchronous simulation.
///
/// Requests return immediately with a handle; the simulation polls the handle
/// on later ticks. Terminal results (`Ready`, `Failed`) are handed out once,
/// after which the handle is forgotten. The planner only reports geometry and
/// progress; it never touches agent state.
pub trait PathPlanner: Send + Sync {
    /// Starts planning a route. A newer request by the same agent supersedes
    /// any older one still in flight.
    fn request_path(&self, agent: EntityId, from: Vec2, to: Vec2) -> PathHandle;

    fn poll_path(&self, handle: PathHandle) -> PathPoll;

    fn cancel_path(&self, handle: PathHandle);
}
