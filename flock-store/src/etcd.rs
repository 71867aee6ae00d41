//! etcd v2 store - speaks the keys API over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::node::Node;
use crate::path;
use crate::traits::Store;

/// Connection settings for [`EtcdStore`].
#[derive(Debug, Clone)]
pub struct EtcdConfig {
    /// Base URL of an etcd member, e.g. `http://127.0.0.1:2379`.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for EtcdConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:2379".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Successful keys API response.
#[derive(Debug, Deserialize)]
struct KeysResponse {
    node: Node,
}

/// Error body returned by the keys API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_code: u64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    cause: String,
}

/// Decode a keys API response body.
fn decode_response(status: StatusCode, body: &str) -> Result<Node> {
    if status.is_success() {
        let resp: KeysResponse = serde_json::from_str(body)
            .map_err(|e| StoreError::Internal(format!("invalid etcd response: {}", e)))?;
        return Ok(resp.node);
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => Err(StoreError::from_code(err.error_code, err.cause, &err.message)),
        Err(_) => Err(StoreError::Transport(format!(
            "etcd returned {}: {}",
            status,
            body.trim()
        ))),
    }
}

/// [`Store`] backed by an etcd cluster.
///
/// The underlying HTTP client pools connections and is safe to share
/// across tasks.
#[derive(Debug, Clone)]
pub struct EtcdStore {
    client: Client,
    endpoint: Url,
}

impl EtcdStore {
    pub fn new(config: EtcdConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Internal(format!("failed to build http client: {}", e)))?;

        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            StoreError::Internal(format!("invalid endpoint {}: {}", config.endpoint, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(StoreError::Internal(format!(
                "invalid endpoint {}: not a base url",
                config.endpoint
            )));
        }

        Ok(Self { client, endpoint })
    }

    /// Keys URL for `key`. Each key segment is percent-encoded.
    fn url(&self, key: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Internal(format!("invalid endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["v2", "keys"])
            .extend(path::normalize(key).split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        key: &str,
        query: &[(&str, &str)],
        value: Option<&str>,
    ) -> Result<Node> {
        let url = self.url(key)?;
        debug!(%method, url = %url, "etcd request");

        let mut req = self.client.request(method, url).query(query);
        if let Some(value) = value {
            req = req.form(&[("value", value)]);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        decode_response(status, &body)
    }
}

#[async_trait]
impl Store for EtcdStore {
    async fn get(&self, key: &str) -> Result<Node> {
        self.request(Method::GET, key, &[("sorted", "true")], None)
            .await
    }

    async fn list(&self, dir: &str, recursive: bool) -> Result<Node> {
        let recursive = if recursive { "true" } else { "false" };
        let node = self
            .request(
                Method::GET,
                dir,
                &[("recursive", recursive), ("sorted", "true")],
                None,
            )
            .await?;
        if !node.dir {
            return Err(StoreError::NotADirectory(node.key));
        }
        Ok(node)
    }

    async fn set(&self, key: &str, value: &str) -> Result<Node> {
        self.request(Method::PUT, key, &[], Some(value)).await
    }

    async fn create_in_order(&self, dir: &str, value: &str) -> Result<Node> {
        self.request(Method::POST, dir, &[], Some(value)).await
    }

    async fn delete(&self, key: &str, recursive: bool) -> Result<()> {
        let query: &[(&str, &str)] = if recursive {
            &[("recursive", "true")]
        } else {
            &[]
        };
        self.request(Method::DELETE, key, query, None).await?;
        Ok(())
    }
}
