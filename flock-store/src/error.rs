//! Store error types.

use thiserror::Error;

/// etcd v2 error code for a missing key.
pub const ERROR_CODE_KEY_NOT_FOUND: u64 = 100;
/// etcd v2 error code for a directory where a file was expected.
pub const ERROR_CODE_NOT_FILE: u64 = 102;
/// etcd v2 error code for a file where a directory was expected.
pub const ERROR_CODE_NOT_DIR: u64 = 104;
/// etcd v2 error code for an already existing key.
pub const ERROR_CODE_NODE_EXIST: u64 = 105;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key not found.
    #[error("key not found: {0}")]
    NotFound(String),

    /// Expected a directory, found a leaf.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a leaf, found a directory.
    #[error("not a file: {0}")]
    NotAFile(String),

    /// Key already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The store could not be reached.
    #[error("transport: {0}")]
    Transport(String),

    /// Internal error.
    #[error("internal: {0}")]
    Internal(String),
}

impl StoreError {
    /// Map an etcd v2 error code to a typed error.
    pub fn from_code(code: u64, cause: String, message: &str) -> Self {
        match code {
            ERROR_CODE_KEY_NOT_FOUND => StoreError::NotFound(cause),
            ERROR_CODE_NOT_FILE => StoreError::NotAFile(cause),
            ERROR_CODE_NOT_DIR => StoreError::NotADirectory(cause),
            ERROR_CODE_NODE_EXIST => StoreError::AlreadyExists(cause),
            _ => StoreError::Internal(format!("{} ({}): {}", message, code, cause)),
        }
    }

    /// True if the error means the key does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_maps_known_codes() {
        let err = StoreError::from_code(100, "/a".into(), "Key not found");
        assert!(err.is_not_found());
        assert!(matches!(
            StoreError::from_code(104, "/a".into(), "Not a directory"),
            StoreError::NotADirectory(_)
        ));
        assert!(matches!(
            StoreError::from_code(105, "/a".into(), "Key already exists"),
            StoreError::AlreadyExists(_)
        ));
    }

    #[test]
    fn test_from_code_unknown_is_internal() {
        let err = StoreError::from_code(300, "/a".into(), "Raft Internal Error");
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("Raft Internal Error"));
    }
}
