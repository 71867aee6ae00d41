//! flock-resource: declared units of system state and their convergence.
//!
//! A [`Resource`] is built from a decoded declarative object through the
//! [`Registry`], evaluated against the live system, and driven toward
//! its declared state by [`reconcile`]:
//! - `Evaluate` reports the observed and wanted [`State`]
//! - [`plan`] picks exactly one of Create, Delete, Update or nothing
//! - the chosen operation mutates the system
//!
//! Capability-specific resource types (the systemd [`ServiceResource`])
//! are only registered when the host provides the capability.

pub mod error;
pub mod probe;
pub mod reconcile;
pub mod registry;
pub mod resource;
pub mod service;
pub mod state;
pub mod systemctl;
pub mod unit;

pub use error::{ResourceError, Result};
pub use reconcile::reconcile;
pub use registry::{Constructor, Registry};
pub use resource::{Object, Resource};
pub use service::{ServiceDecl, ServiceDefaults, ServiceResource, ServiceSpec};
pub use state::{Action, State, StateKind, plan};
pub use systemctl::Systemctl;
pub use unit::{JobMode, JobResult, UnitFileChange, UnitManager};
