//! Istio status tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ISTIOD_RELEASE, default_istio_namespace};
use crate::cluster::ClusterResult;
use crate::domains::tools::definitions::common::json_result;
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

const CNI_DAEMON_SET: &str = "istio-cni-node";

/// Parameters for the Istio status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckIstioStatusParams {
    /// Namespace of the control plane.
    #[serde(default = "default_istio_namespace")]
    pub namespace: String,
}

impl ToolParams for CheckIstioStatusParams {}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ComponentStatus {
    pub name: String,
    pub ready: bool,
    pub replicas: i32,
    pub available: i32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct IstioStatus {
    pub installed: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub components: Vec<ComponentStatus>,
    pub namespace: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Inspect the control plane in `namespace`.
///
/// A missing namespace is a valid "not installed" answer; only failures
/// reading the namespace itself are errors.
pub(crate) async fn istio_status(ctx: &ToolContext, namespace: &str) -> ClusterResult<IstioStatus> {
    let cluster = &ctx.cluster;

    match cluster.get_namespace(namespace).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() => {
            return Ok(IstioStatus {
                installed: false,
                version: String::new(),
                components: Vec::new(),
                namespace: namespace.to_string(),
                issues: vec!["Istio namespace not found".to_string()],
            });
        }
        Err(e) => return Err(e),
    }

    let mut components = Vec::new();
    let mut issues = Vec::new();
    let mut installed = false;

    match cluster.get_daemon_set(namespace, CNI_DAEMON_SET).await {
        Ok(cni) => {
            let ready = cni.is_ready();
            components.push(ComponentStatus {
                name: CNI_DAEMON_SET.to_string(),
                ready,
                replicas: cni.status.desired_number_scheduled,
                available: cni.status.number_ready,
            });
            if !ready {
                issues.push(format!("{} is not ready", CNI_DAEMON_SET));
            }
            installed = true;
        }
        Err(e) => debug!("No CNI DaemonSet: {}", e),
    }

    match cluster.list_deployments(namespace, "app=istiod").await {
        Err(e) => issues.push(format!("Failed to list istiod deployments: {}", e)),
        Ok(deployments) => match deployments.first() {
            None => components.push(ComponentStatus {
                name: "istiod".to_string(),
                ready: false,
                replicas: 0,
                available: 0,
            }),
            Some(istiod) => {
                installed = true;
                let ready = istiod.is_ready();
                components.push(ComponentStatus {
                    name: "istiod".to_string(),
                    ready,
                    replicas: istiod.status.replicas,
                    available: istiod.status.available_replicas,
                });
                if !ready {
                    issues.push("istiod is not ready".to_string());
                }
            }
        },
    }

    let version = match ctx.helm.list_releases(namespace, ISTIOD_RELEASE).await {
        Ok(releases) => releases
            .first()
            .map(|r| r.version().unwrap_or("unknown").to_string()),
        Err(e) => {
            debug!("Could not read istiod release: {}", e);
            None
        }
    };

    Ok(IstioStatus {
        installed,
        version: version.unwrap_or_else(|| "unknown".to_string()),
        components,
        namespace: namespace.to_string(),
        issues,
    })
}

/// Reports control plane components, readiness and version.
pub struct CheckIstioStatusTool;

#[async_trait]
impl ToolDefinition for CheckIstioStatusTool {
    const NAME: &'static str = "check_istio_status";
    const DESCRIPTION: &'static str = "Check the status of Istio installation";

    type Params = CheckIstioStatusParams;

    #[instrument(skip_all, fields(namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        match istio_status(ctx, &params.namespace).await {
            Ok(status) => json_result(&status),
            Err(e) => ToolError::step("Failed to get Istio status", e).into_result(),
        }
    }
}
