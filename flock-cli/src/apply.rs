//! Local application of a resource manifest.
//!
//! A manifest groups declarative objects by resource type:
//!
//! ```json
//! { "service": [ { "name": "nginx", "enable": true } ] }
//! ```
//!
//! Every object is built before anything is reconciled, so a bad entry
//! aborts the run without touching the host.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use flock_resource::{Object, Registry, Resource, reconcile};
use tracing::error;

use crate::output::ApplyRow;

/// One declared resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub resource_type: String,
    pub object: Object,
}

pub fn parse_manifest(text: &str) -> Result<Vec<Declaration>> {
    let manifest: BTreeMap<String, Vec<Object>> =
        serde_json::from_str(text).context("invalid manifest")?;

    Ok(manifest
        .into_iter()
        .flat_map(|(resource_type, objects)| {
            objects.into_iter().map(move |object| Declaration {
                resource_type: resource_type.clone(),
                object,
            })
        })
        .collect())
}

pub async fn load_manifest(path: &Path) -> Result<Vec<Declaration>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_manifest(&text).with_context(|| format!("in {}", path.display()))
}

/// Build every declaration. Resource ids must be unique.
pub fn build(registry: &Registry, decls: &[Declaration]) -> Result<Vec<Box<dyn Resource>>> {
    let mut seen = HashSet::new();
    let mut resources = Vec::with_capacity(decls.len());

    for (i, decl) in decls.iter().enumerate() {
        let resource = registry
            .build(&decl.resource_type, &decl.object)
            .with_context(|| format!("{} entry #{}", decl.resource_type, i + 1))?;
        if !seen.insert(resource.id()) {
            bail!("{} declared more than once", resource.id());
        }
        resources.push(resource);
    }
    Ok(resources)
}

/// Reconcile resources in order. A failure is reported and the rest still run.
pub async fn apply(resources: &[Box<dyn Resource>]) -> Vec<ApplyRow> {
    let mut rows = Vec::with_capacity(resources.len());
    for resource in resources {
        let row = match reconcile(resource.as_ref()).await {
            Ok(action) => ApplyRow {
                resource: resource.id(),
                action: action.to_string(),
                error: "-".to_string(),
            },
            Err(e) => {
                error!(resource = %resource.id(), "apply failed: {}", e);
                ApplyRow {
                    resource: resource.id(),
                    action: "-".to_string(),
                    error: e.to_string(),
                }
            }
        };
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use flock_resource::Systemctl;
    use flock_resource::service;

    fn registry() -> Registry {
        let registry = Registry::new();
        let units = Arc::new(Systemctl::with_binary("/nonexistent/systemctl"));
        service::register(&registry, units, Duration::from_secs(1)).unwrap();
        registry
    }

    #[test]
    fn test_parse_manifest() {
        let decls = parse_manifest(
            r#"{"service": [{"name": "nginx"}, {"name": "cron", "state": "stopped"}]}"#,
        )
        .unwrap();
        assert_eq!(decls.len(), 2);
        assert!(decls.iter().all(|d| d.resource_type == "service"));
        assert_eq!(decls[1].object["state"], "stopped");
    }

    #[test]
    fn test_parse_manifest_rejects_non_list() {
        assert!(parse_manifest(r#"{"service": {"name": "nginx"}}"#).is_err());
        assert!(parse_manifest("[]").is_err());
    }

    #[test]
    fn test_build_checks_types_and_ids() {
        let registry = registry();

        let ok = parse_manifest(r#"{"service": [{"name": "a"}, {"name": "b"}]}"#).unwrap();
        let resources = build(&registry, &ok).unwrap();
        let ids: Vec<String> = resources.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["service[a]", "service[b]"]);

        let unknown = parse_manifest(r#"{"package": [{"name": "vim"}]}"#).unwrap();
        assert!(build(&registry, &unknown).is_err());

        let dup = parse_manifest(r#"{"service": [{"name": "a"}, {"name": "a"}]}"#).unwrap();
        let err = build(&registry, &dup).err().unwrap();
        assert!(err.to_string().contains("more than once"));
    }

    #[tokio::test]
    async fn test_apply_reports_failures_per_resource() {
        let registry = registry();
        let decls = parse_manifest(r#"{"service": [{"name": "a"}, {"name": "b"}]}"#).unwrap();
        let resources = build(&registry, &decls).unwrap();

        let rows = apply(&resources).await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.action == "-" && r.error != "-"));
    }

    #[tokio::test]
    async fn test_load_manifest_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        tokio::fs::write(&path, r#"{"service": [{"name": "sshd", "enable": true}]}"#)
            .await
            .unwrap();

        let decls = load_manifest(&path).await.unwrap();
        assert_eq!(decls[0].object["enable"], true);

        assert!(load_manifest(&dir.path().join("missing.json")).await.is_err());
    }
}
