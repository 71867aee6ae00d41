//! Resource error types.

use std::time::Duration;

use thiserror::Error;

use crate::state::StateKind;

/// Errors that can occur while building or reconciling resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No constructor is registered for the resource type.
    #[error("unknown resource type: {0}")]
    UnknownType(String),

    /// A constructor for the resource type already exists.
    #[error("resource type already registered: {0}")]
    AlreadyRegistered(String),

    /// The declarative object does not match the resource schema.
    #[error("decode: {0}")]
    Decode(String),

    /// The unit reports a state outside the known set.
    #[error("invalid unit state: {0}")]
    InvalidUnitState(String),

    /// The observed state could not be determined.
    #[error("current state unknown (want {want})")]
    UnknownState { want: StateKind },

    /// No operation converges `current` toward `want`.
    #[error("cannot converge from {current} to {want}")]
    UnsupportedTransition { current: StateKind, want: StateKind },

    /// The capability layer failed.
    #[error("capability: {0}")]
    Capability(String),

    /// A job did not complete in time.
    #[error("{operation} of {unit} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        unit: String,
        timeout: Duration,
    },
}

impl From<serde_json::Error> for ResourceError {
    fn from(e: serde_json::Error) -> Self {
        ResourceError::Decode(e.to_string())
    }
}

/// Result type for resource operations.
pub type Result<T> = std::result::Result<T, ResourceError>;
