//! Worker tasks that back the runtime orchestration.
//!
//! One simulation worker runs per instance; it owns the simulation and is
//! the only task that mutates it.

mod simulation;

pub(crate) use simulation::{Command, SimulationWorker};
