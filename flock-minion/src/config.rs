//! Client configuration.

/// Bounds for fleet-wide queries.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Number of workers issuing per-minion lookups concurrently.
    pub concurrency: usize,
    /// Capacity of the work channel between producer and workers.
    pub queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            queue_capacity: 1024,
        }
    }
}
