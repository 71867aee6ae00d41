//! flock-minion: coordination of a fleet of minions through the store.
//!
//! Every minion owns a subtree under [`keyspace::MINION_SPACE`] keyed by
//! its UUID. [`MinionClient`] turns that layout into typed reads, task
//! submission and fleet-wide queries. Fleet-wide queries run through
//! [`fanout::fan_out`], which bounds the number of in-flight store
//! requests regardless of fleet size.

pub mod classifier;
pub mod client;
pub mod config;
pub mod error;
pub mod fanout;
pub mod keyspace;
pub mod task;

pub use classifier::Classifier;
pub use client::MinionClient;
pub use config::ClientConfig;
pub use error::{MinionError, Result};
pub use task::Task;
