//! Unit management capability.
//!
//! The service resource talks to the init system only through
//! [`UnitManager`]. Each call is self-contained: whatever connection it
//! needs is opened and released within the call.

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

/// How a start/stop job interacts with already queued jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobMode {
    #[default]
    Replace,
    Fail,
    IgnoreDependencies,
    IgnoreRequirements,
}

impl JobMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JobMode::Replace => "replace",
            JobMode::Fail => "fail",
            JobMode::IgnoreDependencies => "ignore-dependencies",
            JobMode::IgnoreRequirements => "ignore-requirements",
        }
    }
}

/// Outcome of a completed start/stop job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Done,
    Canceled,
    Timeout,
    Failed,
    Dependency,
    Skipped,
    Other(String),
}

impl JobResult {
    pub fn parse(s: &str) -> Self {
        match s {
            "done" => JobResult::Done,
            "canceled" => JobResult::Canceled,
            "timeout" => JobResult::Timeout,
            "failed" => JobResult::Failed,
            "dependency" => JobResult::Dependency,
            "skipped" => JobResult::Skipped,
            other => JobResult::Other(other.to_string()),
        }
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobResult::Done => f.write_str("done"),
            JobResult::Canceled => f.write_str("canceled"),
            JobResult::Timeout => f.write_str("timeout"),
            JobResult::Failed => f.write_str("failed"),
            JobResult::Dependency => f.write_str("dependency"),
            JobResult::Skipped => f.write_str("skipped"),
            JobResult::Other(s) => f.write_str(s),
        }
    }
}

/// A change made to unit files by enable/disable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFileChange {
    /// `symlink` or `unlink`.
    pub change_type: String,
    pub filename: String,
    /// Link target, empty for removals.
    pub destination: String,
}

/// Init-system unit management.
#[async_trait]
pub trait UnitManager: Send + Sync {
    /// Read a unit property, e.g. `ActiveState` or `UnitFileState`.
    async fn unit_property(&self, unit: &str, property: &str) -> Result<String>;

    /// Start a unit and wait for the job to finish.
    async fn start_unit(&self, unit: &str, mode: JobMode) -> Result<JobResult>;

    /// Stop a unit and wait for the job to finish.
    async fn stop_unit(&self, unit: &str, mode: JobMode) -> Result<JobResult>;

    /// Enable unit files for boot.
    async fn enable_unit_files(&self, units: &[String]) -> Result<Vec<UnitFileChange>>;

    /// Disable unit files for boot.
    async fn disable_unit_files(&self, units: &[String]) -> Result<Vec<UnitFileChange>>;

    /// Rescan unit files.
    async fn reload(&self) -> Result<()>;
}
