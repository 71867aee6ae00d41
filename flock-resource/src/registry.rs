//! Registry of resource constructors.
//!
//! Built once at startup and passed to whatever decodes declarative input.
//! Registration happens before any reconciliation; lookups afterwards are
//! read-only.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{ResourceError, Result};
use crate::resource::{Object, Resource};
use crate::service;
use crate::unit::UnitManager;

/// Builds a resource from a declarative object.
pub type Constructor = Arc<dyn Fn(&Object) -> Result<Box<dyn Resource>> + Send + Sync>;

/// Maps resource type names to constructors.
#[derive(Default)]
pub struct Registry {
    constructors: RwLock<HashMap<String, Constructor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every resource type the host supports.
    ///
    /// `systemd` is the result of [`crate::probe::systemd_booted`]; the service
    /// type is only present when it is true.
    pub fn with_host_capabilities(
        systemd: bool,
        units: Arc<dyn UnitManager>,
        job_timeout: Duration,
    ) -> Result<Self> {
        let registry = Self::new();
        if systemd {
            service::register(&registry, units, job_timeout)?;
        } else {
            info!("systemd not detected, service resources unavailable");
        }
        Ok(registry)
    }

    /// Add a constructor. Names are unique.
    pub fn register(&self, type_name: &str, constructor: Constructor) -> Result<()> {
        let mut constructors = self
            .constructors
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if constructors.contains_key(type_name) {
            return Err(ResourceError::AlreadyRegistered(type_name.to_string()));
        }
        constructors.insert(type_name.to_string(), constructor);
        debug!(resource_type = %type_name, "registered resource type");
        Ok(())
    }

    /// Get the constructor for a type.
    pub fn lookup(&self, type_name: &str) -> Result<Constructor> {
        self.constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_name)
            .cloned()
            .ok_or_else(|| ResourceError::UnknownType(type_name.to_string()))
    }

    /// Look up a type and build a resource from `obj`.
    pub fn build(&self, type_name: &str, obj: &Object) -> Result<Box<dyn Resource>> {
        let constructor = self.lookup(type_name)?;
        constructor(obj)
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{State, StateKind};
    use crate::systemctl::Systemctl;
    use async_trait::async_trait;

    struct Marker(String);

    #[async_trait]
    impl Resource for Marker {
        fn id(&self) -> String {
            crate::resource::resource_id("marker", &self.0)
        }
        fn resource_type(&self) -> &'static str {
            "marker"
        }
        async fn evaluate(&self) -> Result<State> {
            Ok(State::new(StateKind::Present))
        }
        async fn create(&self) -> Result<()> {
            Ok(())
        }
        async fn delete(&self) -> Result<()> {
            Ok(())
        }
        async fn update(&self) -> Result<()> {
            Ok(())
        }
    }

    fn marker_constructor() -> Constructor {
        Arc::new(|obj: &Object| -> Result<Box<dyn Resource>> {
            let name = obj
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ResourceError::Decode("missing name".into()))?;
            Ok(Box::new(Marker(name.to_string())))
        })
    }

    #[test]
    fn test_build_registered_type() {
        let registry = Registry::new();
        registry.register("marker", marker_constructor()).unwrap();

        let mut obj = Object::new();
        obj.insert("name".into(), "m1".into());
        let resource = registry.build("marker", &obj).unwrap();
        assert_eq!(resource.id(), "marker[m1]");
    }

    #[test]
    fn test_lookup_unknown_type() {
        let registry = Registry::new();
        assert!(matches!(
            registry.lookup("package"),
            Err(ResourceError::UnknownType(name)) if name == "package"
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = Registry::new();
        registry.register("marker", marker_constructor()).unwrap();
        assert!(matches!(
            registry.register("marker", marker_constructor()),
            Err(ResourceError::AlreadyRegistered(_))
        ));
        assert_eq!(registry.types(), vec!["marker".to_string()]);
    }

    #[test]
    fn test_service_registered_with_systemd() {
        let units = Arc::new(Systemctl::with_binary("/nonexistent/systemctl"));
        let registry =
            Registry::with_host_capabilities(true, units, Duration::from_secs(1)).unwrap();
        assert_eq!(registry.types(), vec![service::SERVICE_RESOURCE_TYPE.to_string()]);
        assert!(registry.lookup(service::SERVICE_RESOURCE_TYPE).is_ok());
    }

    #[test]
    fn test_service_absent_without_systemd() {
        let units = Arc::new(Systemctl::with_binary("/nonexistent/systemctl"));
        let registry =
            Registry::with_host_capabilities(false, units, Duration::from_secs(1)).unwrap();
        assert!(registry.types().is_empty());
        assert!(matches!(
            registry.lookup(service::SERVICE_RESOURCE_TYPE),
            Err(ResourceError::UnknownType(name)) if name == "service"
        ));
    }
}
