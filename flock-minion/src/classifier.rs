//! Minion classifiers.

use serde::{Deserialize, Serialize};

/// A key/value tag attached to a minion, e.g. `role=web`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifier {
    pub key: String,
    pub value: String,
}

impl Classifier {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
