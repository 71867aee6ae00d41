//! The resource abstraction.

use async_trait::async_trait;

use crate::error::Result;
use crate::state::State;

/// An already-decoded declarative object, e.g. one `resource` block.
pub type Object = serde_json::Map<String, serde_json::Value>;

/// A declared, idempotent unit of desired system state.
///
/// `evaluate` is always called first; its [`State`] decides which one of
/// the mutating operations runs. Implementations never retry internally.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Identity, `<type>[<name>]`.
    fn id(&self) -> String;

    /// Registry name of the resource type.
    fn resource_type(&self) -> &'static str;

    /// Observe the live system.
    async fn evaluate(&self) -> Result<State>;

    /// Bring the resource up (e.g. start a service).
    async fn create(&self) -> Result<()>;

    /// Take the resource down (e.g. stop a service).
    async fn delete(&self) -> Result<()>;

    /// Converge attributes that `current == want` does not cover.
    async fn update(&self) -> Result<()>;
}

/// Format a resource identity.
pub fn resource_id(resource_type: &str, name: &str) -> String {
    format!("{}[{}]", resource_type, name)
}
