//! Data-driven content definitions and loaders.
//!
//! This crate houses the static content of an arena session and provides
//! loaders for its data files:
//! - Agent templates (data-driven via RON)
//! - Arena layouts (data-driven via RON)
//! - Session configuration (data-driven via TOML)
//!
//! Content is consumed by the runtime when it builds collaborators and never
//! appears in replicated state.

pub mod layout;
pub mod session;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use layout::{ArenaLayout, LayoutError};
pub use session::{BusSection, PathingSection, SessionConfig, SessionSection, SpawnerSection};

#[cfg(feature = "loaders")]
pub use loaders::{ArenaLoader, ConfigLoader, ContentBundle, ContentFactory, TemplateLoader};
