//! Store trait definition.
//!
//! Abstracts the coordination store so the minion client works the same
//! against etcd and the in-memory backend.

use async_trait::async_trait;

use crate::error::Result;
use crate::node::Node;

/// Hierarchical key-value store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read a key. Directories come back with their immediate children.
    async fn get(&self, key: &str) -> Result<Node>;

    /// Read a directory, optionally with its whole subtree.
    ///
    /// Children are sorted by key.
    async fn list(&self, dir: &str, recursive: bool) -> Result<Node>;

    /// Create or overwrite a leaf, creating parent directories as needed.
    async fn set(&self, key: &str, value: &str) -> Result<Node>;

    /// Create a new leaf under `dir` with a store-allocated key.
    ///
    /// Allocated keys are strictly increasing, so listing the directory
    /// sorted by key yields insertion order.
    async fn create_in_order(&self, dir: &str, value: &str) -> Result<Node>;

    /// Delete a key. Directories require `recursive`.
    async fn delete(&self, key: &str, recursive: bool) -> Result<()>;
}
