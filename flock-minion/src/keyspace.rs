//! Minion keyspace layout.
//!
//! ```text
//! /flock/minion/<uuid>/name
//! /flock/minion/<uuid>/lastseen
//! /flock/minion/<uuid>/classifier/<key>
//! /flock/minion/<uuid>/queue/<ordered-id>
//! /flock/minion/<uuid>/log/<task-uuid>
//! ```

use flock_store::path;
use uuid::Uuid;

/// Root of the minion space.
pub const MINION_SPACE: &str = "/flock/minion";

pub fn minion_dir(minion: Uuid) -> String {
    path::join(MINION_SPACE, [minion.to_string()])
}

pub fn name_key(minion: Uuid) -> String {
    path::join(&minion_dir(minion), ["name"])
}

pub fn lastseen_key(minion: Uuid) -> String {
    path::join(&minion_dir(minion), ["lastseen"])
}

pub fn classifier_dir(minion: Uuid) -> String {
    path::join(&minion_dir(minion), ["classifier"])
}

pub fn classifier_key(minion: Uuid, key: &str) -> String {
    path::join(&classifier_dir(minion), [key])
}

pub fn queue_dir(minion: Uuid) -> String {
    path::join(&minion_dir(minion), ["queue"])
}

pub fn log_dir(minion: Uuid) -> String {
    path::join(&minion_dir(minion), ["log"])
}

pub fn log_key(minion: Uuid, task: Uuid) -> String {
    path::join(&log_dir(minion), [task.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let m = Uuid::parse_str("6fa459ea-ee8a-3ca4-894e-db77e160355e").unwrap();
        let t = Uuid::parse_str("16fd2706-8baf-433b-82eb-8c7fada847da").unwrap();

        assert_eq!(
            name_key(m),
            "/flock/minion/6fa459ea-ee8a-3ca4-894e-db77e160355e/name"
        );
        assert_eq!(
            classifier_key(m, "role"),
            "/flock/minion/6fa459ea-ee8a-3ca4-894e-db77e160355e/classifier/role"
        );
        assert_eq!(
            log_key(m, t),
            "/flock/minion/6fa459ea-ee8a-3ca4-894e-db77e160355e/log/16fd2706-8baf-433b-82eb-8c7fada847da"
        );
    }
}
