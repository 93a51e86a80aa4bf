//! Sample workloads for exercising the mesh.

mod httpbin;
mod manifests;
mod sleep;

pub use httpbin::{DeployHttpbinAppTool, UndeployHttpbinAppTool};
pub use manifests::{HTTPBIN_PORT, SampleApp};
pub use sleep::{DeploySleepAppTool, UndeploySleepAppTool};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domains::tools::definitions::common::default_namespace;
use crate::domains::tools::params::{ensure_range, require_non_empty};
use crate::domains::tools::{ToolContext, ToolError, ToolParams};

const MAX_REPLICAS: u32 = 100;

fn default_replicas() -> u32 {
    1
}

/// Parameters for deploying a sample application.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeployAppParams {
    /// Target namespace; created and labelled for sidecar injection if needed.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Number of replicas.
    #[serde(default = "default_replicas")]
    #[schemars(range(min = 1, max = 100))]
    pub replicas: u32,
}

impl ToolParams for DeployAppParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("namespace", &self.namespace)?;
        ensure_range("replicas", self.replicas, 1, MAX_REPLICAS)
    }
}

/// Parameters for removing a sample application.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UndeployAppParams {
    /// Namespace the application runs in.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl ToolParams for UndeployAppParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("namespace", &self.namespace)
    }
}

/// Apply the namespace and every object of `app`, stopping at the first failure.
async fn deploy(app: SampleApp, params: &DeployAppParams, ctx: &ToolContext) -> Result<(), ToolError> {
    let cluster = &ctx.cluster;
    let namespace = params.namespace.as_str();

    cluster
        .apply(&SampleApp::namespace(namespace))
        .await
        .map_err(|e| ToolError::step("Failed to create/update namespace", e))?;
    cluster
        .apply(&app.service_account(namespace))
        .await
        .map_err(|e| ToolError::step("Failed to create service account", e))?;
    cluster
        .apply(&app.deployment(namespace, params.replicas))
        .await
        .map_err(|e| ToolError::step("Failed to create deployment", e))?;
    if let Some(service) = app.service(namespace) {
        cluster
            .apply(&service)
            .await
            .map_err(|e| ToolError::step("Failed to create service", e))?;
    }

    info!("{} deployed to {} with {} replicas", app.name(), namespace, params.replicas);
    Ok(())
}

/// Delete every object of `app`. Missing objects are expected; other
/// failures are logged and skipped.
async fn undeploy(app: SampleApp, params: &UndeployAppParams, ctx: &ToolContext) {
    for kind in app.owned_resources() {
        match ctx
            .cluster
            .delete(*kind, Some(&params.namespace), app.name())
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => warn!("Failed to delete {} {}: {}", app.name(), kind.as_str(), e),
        }
    }
}
