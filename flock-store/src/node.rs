//! Store node type.

use serde::{Deserialize, Serialize};

use crate::path;

/// A single entry of the hierarchical store.
///
/// Leaves carry a value; directories carry children (only populated for
/// the levels that were requested).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub dir: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub created_index: u64,
    #[serde(default)]
    pub modified_index: u64,
}

impl Node {
    /// Last path segment of the key.
    pub fn name(&self) -> &str {
        path::basename(&self.key)
    }

    /// Value of a leaf, empty for directories.
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}
