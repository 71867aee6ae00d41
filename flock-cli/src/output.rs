//! Table rows for command output.

use chrono::DateTime;
use flock_minion::{Classifier, Task};
use tabled::Tabled;

#[derive(Tabled)]
pub struct MinionRow {
    #[tabled(rename = "MINION")]
    pub id: String,
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "LAST SEEN")]
    pub lastseen: String,
}

#[derive(Tabled)]
pub struct ClassifierRow {
    #[tabled(rename = "KEY")]
    pub key: String,
    #[tabled(rename = "VALUE")]
    pub value: String,
}

impl From<Classifier> for ClassifierRow {
    fn from(c: Classifier) -> Self {
        Self {
            key: c.key,
            value: c.value,
        }
    }
}

#[derive(Tabled)]
pub struct ClassifiedRow {
    #[tabled(rename = "MINION")]
    pub minion: String,
    #[tabled(rename = "KEY")]
    pub key: String,
    #[tabled(rename = "VALUE")]
    pub value: String,
}

impl ClassifiedRow {
    pub fn new(minion: String, c: Classifier) -> Self {
        Self {
            minion,
            key: c.key,
            value: c.value,
        }
    }
}

#[derive(Tabled)]
pub struct TaskResultRow {
    #[tabled(rename = "MINION")]
    pub minion: String,
    #[tabled(rename = "PROCESSED")]
    pub processed: String,
    #[tabled(rename = "RESULT")]
    pub result: String,
    #[tabled(rename = "ERROR")]
    pub error: String,
}

impl TaskResultRow {
    pub fn new(minion: String, task: Task) -> Self {
        let processed = task
            .processed_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        Self {
            minion,
            processed,
            result: dash_if_empty(task.result),
            error: dash_if_empty(task.error),
        }
    }
}

#[derive(Tabled)]
pub struct ApplyRow {
    #[tabled(rename = "RESOURCE")]
    pub resource: String,
    #[tabled(rename = "ACTION")]
    pub action: String,
    #[tabled(rename = "ERROR")]
    pub error: String,
}

/// Render unix seconds as a UTC timestamp, `-` when unset or out of range.
pub fn format_timestamp(secs: i64) -> String {
    if secs <= 0 {
        return "-".to_string();
    }
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn dash_if_empty(s: String) -> String {
    if s.is_empty() { "-".to_string() } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "-");
        assert_eq!(format_timestamp(1_500_000_000), "2017-07-14 02:40:00");
    }

    #[test]
    fn test_task_row_placeholders() {
        let task = Task::new("uptime", vec![]);
        let row = TaskResultRow::new("m1".to_string(), task);
        assert_eq!(row.processed, "-");
        assert_eq!(row.result, "-");
        assert_eq!(row.error, "-");
    }
}
