//! Identity, health, clocks, and read-only agent views.
//!
//! Nothing here owns behavior; these are the plain values the rest of the
//! crate passes around.
mod agent;
mod common;

pub use agent::{AgentSnapshot, AgentState};
pub use common::{EntityId, Health, SimClock, TickContext};
