//! In-memory store.
//!
//! Mirrors the etcd v2 data model: explicit directories, leaves with
//! values, and a single global index that orders every write.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::node::Node;
use crate::path;
use crate::traits::Store;

#[derive(Debug, Clone)]
enum Entry {
    Dir {
        created_index: u64,
        modified_index: u64,
    },
    Leaf {
        value: String,
        created_index: u64,
        modified_index: u64,
    },
}

#[derive(Debug, Default)]
struct Tree {
    entries: BTreeMap<String, Entry>,
    index: u64,
}

impl Tree {
    fn next_index(&mut self) -> u64 {
        self.index += 1;
        self.index
    }

    fn is_dir(&self, key: &str) -> bool {
        key == "/" || matches!(self.entries.get(key), Some(Entry::Dir { .. }))
    }

    /// Create every missing ancestor of `key` as a directory.
    fn ensure_parents(&mut self, key: &str) -> Result<()> {
        let mut ancestors = Vec::new();
        let mut current = path::parent(key);
        while let Some(dir) = current {
            if dir == "/" {
                break;
            }
            current = path::parent(&dir);
            ancestors.push(dir);
        }

        for dir in ancestors.into_iter().rev() {
            match self.entries.get(&dir) {
                Some(Entry::Dir { .. }) => {}
                Some(Entry::Leaf { .. }) => return Err(StoreError::NotADirectory(dir)),
                None => {
                    let index = self.next_index();
                    self.entries.insert(
                        dir,
                        Entry::Dir {
                            created_index: index,
                            modified_index: index,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    fn leaf_node(key: &str, value: &str, created_index: u64, modified_index: u64) -> Node {
        Node {
            key: key.to_string(),
            value: Some(value.to_string()),
            dir: false,
            nodes: Vec::new(),
            created_index,
            modified_index,
        }
    }

    /// Immediate child keys of a directory, sorted.
    fn children(&self, dir: &str) -> Vec<String> {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{}/", dir)
        };
        self.entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains('/'))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Build a node for `key`, descending `depth` directory levels.
    fn node(&self, key: &str, depth: Option<usize>) -> Result<Node> {
        let (created_index, modified_index) = match self.entries.get(key) {
            Some(Entry::Leaf {
                value,
                created_index,
                modified_index,
            }) => {
                return Ok(Self::leaf_node(
                    key,
                    value,
                    *created_index,
                    *modified_index,
                ));
            }
            Some(Entry::Dir {
                created_index,
                modified_index,
            }) => (*created_index, *modified_index),
            None if key == "/" => (0, 0),
            None => return Err(StoreError::NotFound(key.to_string())),
        };

        let mut nodes = Vec::new();
        if depth != Some(0) {
            let next = depth.map(|d| d - 1);
            for child in self.children(key) {
                nodes.push(self.node(&child, next)?);
            }
        }

        Ok(Node {
            key: key.to_string(),
            value: None,
            dir: true,
            nodes,
            created_index,
            modified_index,
        })
    }
}

/// Process-local implementation of [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tree: RwLock<Tree>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Node> {
        let key = path::normalize(key);
        debug!(key = %key, "memory get");
        let tree = self.tree.read().await;
        tree.node(&key, Some(1))
    }

    async fn list(&self, dir: &str, recursive: bool) -> Result<Node> {
        let key = path::normalize(dir);
        debug!(key = %key, recursive, "memory list");
        let tree = self.tree.read().await;
        if !tree.is_dir(&key) {
            return match tree.entries.get(&key) {
                Some(_) => Err(StoreError::NotADirectory(key)),
                None => Err(StoreError::NotFound(key)),
            };
        }
        tree.node(&key, if recursive { None } else { Some(1) })
    }

    async fn set(&self, key: &str, value: &str) -> Result<Node> {
        let key = path::normalize(key);
        let mut tree = self.tree.write().await;
        if tree.is_dir(&key) {
            return Err(StoreError::NotAFile(key));
        }
        tree.ensure_parents(&key)?;

        let index = tree.next_index();
        let created_index = match tree.entries.get(&key) {
            Some(Entry::Leaf { created_index, .. }) => *created_index,
            _ => index,
        };
        tree.entries.insert(
            key.clone(),
            Entry::Leaf {
                value: value.to_string(),
                created_index,
                modified_index: index,
            },
        );
        Ok(Tree::leaf_node(&key, value, created_index, index))
    }

    async fn create_in_order(&self, dir: &str, value: &str) -> Result<Node> {
        let dir = path::normalize(dir);
        let mut tree = self.tree.write().await;
        if let Some(Entry::Leaf { .. }) = tree.entries.get(&dir) {
            return Err(StoreError::NotADirectory(dir));
        }
        // Register the directory itself before allocating the child key.
        let placeholder = path::join(&dir, ["_"]);
        tree.ensure_parents(&placeholder)?;

        let index = tree.next_index();
        let key = path::join(&dir, [format!("{:020}", index)]);
        tree.entries.insert(
            key.clone(),
            Entry::Leaf {
                value: value.to_string(),
                created_index: index,
                modified_index: index,
            },
        );
        Ok(Tree::leaf_node(&key, value, index, index))
    }

    async fn delete(&self, key: &str, recursive: bool) -> Result<()> {
        let key = path::normalize(key);
        let mut tree = self.tree.write().await;
        match tree.entries.get(&key) {
            None => Err(StoreError::NotFound(key)),
            Some(Entry::Leaf { .. }) => {
                tree.entries.remove(&key);
                Ok(())
            }
            Some(Entry::Dir { .. }) if !recursive => Err(StoreError::NotAFile(key)),
            Some(Entry::Dir { .. }) => {
                let prefix = format!("{}/", key);
                tree.entries
                    .retain(|k, _| k != &key && !k.starts_with(&prefix));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get_leaf() {
        let store = MemoryStore::new();
        store.set("/a/b/c", "hello").await.unwrap();

        let node = store.get("/a/b/c").await.unwrap();
        assert!(!node.dir);
        assert_eq!(node.value_str(), "hello");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("/missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_set_creates_parent_directories() {
        let store = MemoryStore::new();
        store.set("/a/b/c", "1").await.unwrap();

        let a = store.get("/a").await.unwrap();
        assert!(a.dir);
        assert_eq!(a.nodes.len(), 1);
        assert_eq!(a.nodes[0].key, "/a/b");
        // Non-recursive reads do not descend past the first level.
        assert!(a.nodes[0].nodes.is_empty());
    }

    #[tokio::test]
    async fn test_list_recursive_returns_subtree() {
        let store = MemoryStore::new();
        store.set("/a/b/c", "1").await.unwrap();
        store.set("/a/b/d", "2").await.unwrap();
        store.set("/a/e", "3").await.unwrap();

        let a = store.list("/a", true).await.unwrap();
        assert_eq!(a.nodes.len(), 2);
        let b = a.nodes.iter().find(|n| n.key == "/a/b").unwrap();
        let values: Vec<&str> = b.nodes.iter().map(|n| n.value_str()).collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_list_leaf_is_not_a_directory() {
        let store = MemoryStore::new();
        store.set("/a", "1").await.unwrap();
        let err = store.list("/a", false).await.unwrap_err();
        assert!(matches!(err, StoreError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_set_under_leaf_fails() {
        let store = MemoryStore::new();
        store.set("/a", "1").await.unwrap();
        let err = store.set("/a/b", "2").await.unwrap_err();
        assert!(matches!(err, StoreError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_create_in_order_preserves_insertion_order() {
        let store = MemoryStore::new();
        for value in ["first", "second", "third"] {
            store.create_in_order("/q", value).await.unwrap();
        }
        // Unrelated writes interleave with the queue.
        store.set("/other", "x").await.unwrap();
        store.create_in_order("/q", "fourth").await.unwrap();

        let q = store.list("/q", false).await.unwrap();
        let values: Vec<&str> = q.nodes.iter().map(|n| n.value_str()).collect();
        assert_eq!(values, vec!["first", "second", "third", "fourth"]);
    }

    #[tokio::test]
    async fn test_delete_directory_requires_recursive() {
        let store = MemoryStore::new();
        store.set("/a/b", "1").await.unwrap();

        assert!(matches!(
            store.delete("/a", false).await.unwrap_err(),
            StoreError::NotAFile(_)
        ));
        store.delete("/a", true).await.unwrap();
        assert!(store.get("/a/b").await.unwrap_err().is_not_found());
    }
}
