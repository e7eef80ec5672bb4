//! Common error infrastructure for arena-core.
//!
//! Nothing in this crate returns an error that should terminate the process.
//! Every failure has a local degradation path, and [`ErrorSeverity`] tells the
//! caller which one: retry, skip, or disable the affected agent.

use crate::env::OracleError;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: transient conditions that clear on retry (no walkable
///   node, path service hiccup)
/// - **Validation**: invalid input that is dropped without retry (unknown
///   template, malformed event)
/// - **Internal**: unexpected inconsistencies that deserve investigation
/// - **Fatal**: the affected agent cannot be simulated and is disabled; the
///   rest of the session continues
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all arena-core errors.
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait ArenaError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Errors detected while bringing an agent up.
///
/// A configuration error is fatal for the agent that raised it: the agent is
/// disabled and the rest of the session keeps running.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("required collaborator missing: {0}")]
    MissingCollaborator(#[from] OracleError),

    #[error("invalid range for {field}: [{min}, {max}]")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f32 },

    #[error("unknown agent template '{0}'")]
    UnknownTemplate(String),
}

impl ArenaError for ConfigurationError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownTemplate(_) => ErrorSeverity::Validation,
            Self::MissingCollaborator(_) | Self::InvalidRange { .. } | Self::InvalidValue { .. } => {
                ErrorSeverity::Fatal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCollaborator(_) => "CONFIG_MISSING_COLLABORATOR",
            Self::InvalidRange { .. } => "CONFIG_INVALID_RANGE",
            Self::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            Self::UnknownTemplate(_) => "CONFIG_UNKNOWN_TEMPLATE",
        }
    }
}
