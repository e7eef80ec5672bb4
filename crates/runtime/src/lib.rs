//! Runtime orchestration for networked arena sessions.
//!
//! This crate wires the synchronous `arena-core` simulation to Tokio: a
//! worker per instance ticks the simulation at a fixed rate, a topic-based
//! [`ReplicationBus`] carries authoritative events to mirrors, and
//! asynchronous collaborators such as the pathfinding service sit behind the
//! core's synchronous seams.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the replication bus and its wire format
//! - [`oracle`] and [`pathing`] implement the collaborators agents consume
//! - [`services`] are the outward-facing sinks (chat, cleanup, presentation)
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod oracle;
pub mod pathing;
pub mod runtime;
pub mod services;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use events::{Envelope, Frame, PeerId, ReplicationBus, Topic, WireError};
pub use oracle::{NavGrid, OracleManager, PhysicsWorld, PlayerDirectory, PlayerEffect, PlayerRecord};
pub use pathing::{
    PathPlanningAdapter, PathfindingService, PlanningError, RetryPolicy, StraightLinePathfinder,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use services::{
    ChatSink, CleanupScheduler, PresentationSink, Services, TokioCleanup, TracingChat,
    TracingPresentation,
};
