//! Tasks addressed to minions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of work for a single minion.
///
/// The client fills `id`, `command` and `args` on submission. The minion
/// sets the timestamps, `result` and `error` when it writes the task to
/// its log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Unix seconds when the minion picked the task from its queue.
    #[serde(default)]
    pub time_received: i64,
    /// Unix seconds when the minion finished the task.
    #[serde(default)]
    pub time_processed: i64,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub error: String,
}

impl Task {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            command: command.into(),
            args,
            time_received: 0,
            time_processed: 0,
            result: String::new(),
            error: String::new(),
        }
    }

    /// Time the minion finished processing, if it has.
    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        if self.time_processed == 0 {
            return None;
        }
        DateTime::from_timestamp(self.time_processed, 0)
    }
}
