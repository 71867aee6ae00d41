//! flock-store: the hierarchical key-value store that backs minion
//! coordination.
//!
//! Handlers work against the [`Store`] trait. Two backends exist:
//! - [`MemoryStore`]: process-local, used by tests and local runs
//! - [`EtcdStore`]: the etcd v2 keys API over HTTP

pub mod error;
pub mod etcd;
pub mod memory;
pub mod node;
pub mod path;
pub mod traits;

pub use error::{Result, StoreError};
pub use etcd::{EtcdConfig, EtcdStore};
pub use memory::MemoryStore;
pub use node::Node;
pub use traits::Store;
