//! Minion client error types.

use flock_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by the minion coordination client.
#[derive(Debug, Error)]
pub enum MinionError {
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The target minion has no subtree in the store.
    #[error("unknown minion: {0}")]
    UnknownMinion(Uuid),

    /// Stored payload is not valid JSON for the expected type.
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    /// Stored integer is malformed.
    #[error("parse: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// A fan-out worker task failed to complete.
    #[error("worker: {0}")]
    Worker(String),
}

impl MinionError {
    /// True if the error means a key or minion does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            MinionError::Store(e) => e.is_not_found(),
            MinionError::UnknownMinion(_) => true,
            _ => false,
        }
    }
}

/// Result type for minion client operations.
pub type Result<T> = std::result::Result<T, MinionError>;
