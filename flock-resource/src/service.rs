//! systemd service resource.
//!
//! Declared as:
//!
//! ```json
//! { "name": "nginx", "state": "running", "enable": true }
//! ```
//!
//! and managed as the unit `<name>.service`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::error::{ResourceError, Result};
use crate::registry::{Constructor, Registry};
use crate::resource::{Object, Resource, resource_id};
use crate::state::{State, StateKind};
use crate::unit::{JobMode, JobResult, UnitManager};

/// Registry name of the service resource type.
pub const SERVICE_RESOURCE_TYPE: &str = "service";

/// Service fields as written in a declaration. Unset fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceDecl {
    pub name: String,
    #[serde(default)]
    pub state: Option<StateKind>,
    #[serde(default)]
    pub enable: Option<bool>,
}

/// Values for fields a declaration leaves unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefaults {
    pub state: StateKind,
    pub enable: bool,
}

impl Default for ServiceDefaults {
    fn default() -> Self {
        Self {
            state: StateKind::Running,
            enable: false,
        }
    }
}

/// Fully resolved service declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    pub state: StateKind,
    pub enable: bool,
}

impl ServiceSpec {
    /// systemd unit name for the service.
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.name)
    }
}

impl ServiceDecl {
    /// Decode from a declarative object.
    pub fn decode(obj: &Object) -> Result<Self> {
        let decl: ServiceDecl = serde_json::from_value(serde_json::Value::Object(obj.clone()))?;
        if decl.name.trim().is_empty() {
            return Err(ResourceError::Decode("service name must not be empty".into()));
        }
        if let Some(state) = decl.state {
            if !matches!(state, StateKind::Running | StateKind::Stopped) {
                return Err(ResourceError::Decode(format!(
                    "service {}: state must be running or stopped, got {}",
                    decl.name, state
                )));
            }
        }
        Ok(decl)
    }

    /// Fill unset fields from `defaults`. Explicit fields always win.
    pub fn merge(self, defaults: &ServiceDefaults) -> ServiceSpec {
        ServiceSpec {
            name: self.name,
            state: self.state.unwrap_or(defaults.state),
            enable: self.enable.unwrap_or(defaults.enable),
        }
    }
}

/// Register the service type, building resources on `units`.
pub fn register(
    registry: &Registry,
    units: Arc<dyn UnitManager>,
    job_timeout: Duration,
) -> Result<()> {
    let constructor: Constructor = Arc::new(move |obj: &Object| -> Result<Box<dyn Resource>> {
        let resource = ServiceResource::from_object(obj, Arc::clone(&units), job_timeout)?;
        Ok(Box::new(resource))
    });
    registry.register(SERVICE_RESOURCE_TYPE, constructor)
}

/// A service managed by systemd.
pub struct ServiceResource {
    spec: ServiceSpec,
    unit_name: String,
    units: Arc<dyn UnitManager>,
    job_timeout: Duration,
}

impl ServiceResource {
    pub fn new(spec: ServiceSpec, units: Arc<dyn UnitManager>, job_timeout: Duration) -> Self {
        let unit_name = spec.unit_name();
        Self {
            spec,
            unit_name,
            units,
            job_timeout,
        }
    }

    /// Decode, apply defaults and build.
    pub fn from_object(
        obj: &Object,
        units: Arc<dyn UnitManager>,
        job_timeout: Duration,
    ) -> Result<Self> {
        let spec = ServiceDecl::decode(obj)?.merge(&ServiceDefaults::default());
        Ok(Self::new(spec, units, job_timeout))
    }

    pub fn spec(&self) -> &ServiceSpec {
        &self.spec
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    /// Whether the unit is enabled at boot.
    ///
    /// Unit file states outside the known set are an error, never `false`.
    pub async fn unit_is_enabled(&self) -> Result<bool> {
        let value = self
            .units
            .unit_property(&self.unit_name, "UnitFileState")
            .await?;

        match value.as_str() {
            "enabled" | "static" | "enabled-runtime" | "linked" | "linked-runtime" => Ok(true),
            "disabled" | "masked" | "masked-runtime" => Ok(false),
            other => Err(ResourceError::InvalidUnitState(format!(
                "{}: UnitFileState {:?}",
                self.unit_name, other
            ))),
        }
    }

    async fn enable_unit(&self) -> Result<()> {
        info!(resource = %self.id(), "enabling service");
        let changes = self
            .units
            .enable_unit_files(&[self.unit_name.clone()])
            .await?;
        for change in changes {
            info!(
                resource = %self.id(),
                "{} {} -> {}",
                change.change_type,
                change.filename,
                change.destination
            );
        }
        Ok(())
    }

    async fn disable_unit(&self) -> Result<()> {
        info!(resource = %self.id(), "disabling service");
        let changes = self
            .units
            .disable_unit_files(&[self.unit_name.clone()])
            .await?;
        for change in changes {
            info!(resource = %self.id(), "{} {}", change.change_type, change.filename);
        }
        Ok(())
    }

    /// Wait for a start/stop job, bounded by the job timeout.
    async fn await_job<F>(&self, operation: &'static str, job: F) -> Result<JobResult>
    where
        F: std::future::Future<Output = Result<JobResult>>,
    {
        let result = timeout(self.job_timeout, job)
            .await
            .map_err(|_| ResourceError::Timeout {
                operation,
                unit: self.unit_name.clone(),
                timeout: self.job_timeout,
            })??;

        if result == JobResult::Done {
            info!(resource = %self.id(), "systemd {} job result: {}", operation, result);
        } else {
            warn!(resource = %self.id(), "systemd {} job result: {}", operation, result);
        }
        Ok(result)
    }
}

#[async_trait]
impl Resource for ServiceResource {
    fn id(&self) -> String {
        resource_id(SERVICE_RESOURCE_TYPE, &self.spec.name)
    }

    fn resource_type(&self) -> &'static str {
        SERVICE_RESOURCE_TYPE
    }

    async fn evaluate(&self) -> Result<State> {
        let mut state = State::new(self.spec.state);

        let active = self
            .units
            .unit_property(&self.unit_name, "ActiveState")
            .await?;
        state.current = match active.as_str() {
            "active" | "reloading" | "activating" => StateKind::Running,
            "inactive" | "failed" | "deactivating" => StateKind::Stopped,
            _ => StateKind::Unknown,
        };

        let enabled = self.unit_is_enabled().await?;
        state.update = self.spec.enable != enabled;

        Ok(state)
    }

    async fn create(&self) -> Result<()> {
        info!(resource = %self.id(), "starting service");
        let job = self.units.start_unit(&self.unit_name, JobMode::Replace);
        self.await_job("start", job).await?;
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        info!(resource = %self.id(), "stopping service");
        let job = self.units.stop_unit(&self.unit_name, JobMode::Replace);
        self.await_job("stop", job).await?;
        Ok(())
    }

    async fn update(&self) -> Result<()> {
        let enabled = self.unit_is_enabled().await?;

        if self.spec.enable && !enabled {
            self.enable_unit().await?;
        } else if !self.spec.enable && enabled {
            self.disable_unit().await?;
        }

        // Reload even without changes so systemd picks up edited unit files.
        self.units.reload().await
    }
}
