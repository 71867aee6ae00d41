//! Minion coordination client.
//!
//! Maps the minion keyspace onto typed operations. Single-key reads
//! propagate every error, including "not found". Fleet-wide queries fan
//! out over all known minions and silently omit minions that lack the
//! requested classifier or task.

use std::collections::HashMap;
use std::sync::Arc;

use flock_store::{Node, Store, path};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::Classifier;
use crate::config::ClientConfig;
use crate::error::{MinionError, Result};
use crate::fanout::fan_out;
use crate::keyspace;
use crate::task::Task;

/// Client for the minion space of a coordination store.
#[derive(Clone)]
pub struct MinionClient {
    store: Arc<dyn Store>,
    config: ClientConfig,
}

impl MinionClient {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_config(store, ClientConfig::default())
    }

    pub fn with_config(store: Arc<dyn Store>, config: ClientConfig) -> Self {
        Self { store, config }
    }

    /// Get the name of a minion.
    pub async fn get_name(&self, minion: Uuid) -> Result<String> {
        let node = self.store.get(&keyspace::name_key(minion)).await?;
        Ok(node.value_str().to_string())
    }

    /// Get the time a minion was last seen, in Unix seconds.
    pub async fn get_lastseen(&self, minion: Uuid) -> Result<i64> {
        let node = self.store.get(&keyspace::lastseen_key(minion)).await?;
        Ok(node.value_str().trim().parse::<i64>()?)
    }

    /// Get a single classifier of a minion.
    pub async fn get_classifier(&self, minion: Uuid, key: &str) -> Result<Classifier> {
        fetch_classifier(self.store.as_ref(), minion, key).await
    }

    /// List the classifier keys of a minion.
    pub async fn get_classifier_keys(&self, minion: Uuid) -> Result<Vec<String>> {
        let dir = self
            .store
            .list(&keyspace::classifier_dir(minion), false)
            .await?;
        Ok(dir.nodes.iter().map(|n| n.name().to_string()).collect())
    }

    /// Get every classifier of a minion.
    ///
    /// A single undecodable classifier fails the whole call.
    pub async fn get_all_classifiers(&self, minion: Uuid) -> Result<Vec<Classifier>> {
        let dir = self
            .store
            .list(&keyspace::classifier_dir(minion), true)
            .await?;

        dir.nodes
            .iter()
            .map(|node| serde_json::from_str(node.value_str()).map_err(MinionError::from))
            .collect()
    }

    /// List the UUIDs of every minion in the store.
    ///
    /// Entries whose name is not a UUID are skipped.
    pub async fn list_minions(&self) -> Result<Vec<Uuid>> {
        let space = self.store.get(keyspace::MINION_SPACE).await?;

        let mut minions = Vec::with_capacity(space.nodes.len());
        for node in &space.nodes {
            let name = path::basename(&node.key);
            match Uuid::parse_str(name) {
                Ok(id) => minions.push(id),
                Err(_) => warn!(entry = %name, "bad minion uuid found"),
            }
        }
        debug!(count = minions.len(), "listed minions");
        Ok(minions)
    }

    /// Get every minion that has a classifier with the given key.
    ///
    /// Keys of the result are minion UUID strings.
    pub async fn get_classified_minions(&self, key: &str) -> Result<HashMap<String, Classifier>> {
        let minions = self.list_minions().await?;
        let store = Arc::clone(&self.store);
        let key = key.to_string();

        fan_out(minions, &self.config, move |minion| {
            let store = Arc::clone(&store);
            let key = key.clone();
            async move { fetch_classifier(store.as_ref(), minion, &key).await }
        })
        .await
    }

    /// Get the logged results of a task from every minion that ran it.
    pub async fn get_task(&self, task: Uuid) -> Result<HashMap<String, Task>> {
        let minions = self.list_minions().await?;
        let store = Arc::clone(&self.store);

        fan_out(minions, &self.config, move |minion| {
            let store = Arc::clone(&store);
            async move { fetch_task_log(store.as_ref(), minion, task).await }
        })
        .await
    }

    /// Submit a task to a minion's queue.
    ///
    /// The queue key is allocated by the store, so concurrent submitters
    /// never collide and the queue reads back in submission order.
    pub async fn submit_task(&self, minion: Uuid, task: &Task) -> Result<()> {
        match self.store.get(&keyspace::minion_dir(minion)).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Err(MinionError::UnknownMinion(minion)),
            Err(e) => return Err(e.into()),
        }

        let data = serde_json::to_string(task)?;
        let node = self
            .store
            .create_in_order(&keyspace::queue_dir(minion), &data)
            .await?;

        info!(minion = %minion, task = %task.id, key = %node.key, "submitted task");
        Ok(())
    }

    /// Read a minion's pending queue in submission order.
    pub async fn get_queue(&self, minion: Uuid) -> Result<Vec<Task>> {
        let dir = match self.store.list(&keyspace::queue_dir(minion), false).await {
            Ok(dir) => dir,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        dir.nodes.iter().map(decode_task).collect()
    }
}

async fn fetch_classifier(store: &dyn Store, minion: Uuid, key: &str) -> Result<Classifier> {
    let node = store.get(&keyspace::classifier_key(minion, key)).await?;
    Ok(serde_json::from_str(node.value_str())?)
}

async fn fetch_task_log(store: &dyn Store, minion: Uuid, task: Uuid) -> Result<Task> {
    let node = store.get(&keyspace::log_key(minion, task)).await?;
    decode_task(&node)
}

fn decode_task(node: &Node) -> Result<Task> {
    Ok(serde_json::from_str(node.value_str())?)
}
