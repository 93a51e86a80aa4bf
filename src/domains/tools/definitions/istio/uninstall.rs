//! Uninstall Istio tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::{
    BASE_RELEASE, CNI_RELEASE, GATEWAY_RELEASE, ISTIOD_RELEASE, default_gateway_namespace,
    default_istio_namespace,
};
use crate::cluster::{ClusterResult, ResourceKind, UninstallRequest};
use crate::domains::tools::definitions::common::{default_helm_timeout, text_result};
use crate::domains::tools::params::ensure_duration;
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

/// Parameters for the Istio uninstall tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UninstallIstioParams {
    /// Namespace of the control plane.
    #[serde(default = "default_istio_namespace")]
    pub namespace: String,

    /// Namespace of the ingress gateway.
    #[serde(default = "default_gateway_namespace")]
    pub gateway_namespace: String,

    /// Also remove the CNI node agent.
    #[serde(default)]
    pub uninstall_cni: bool,

    /// Delete every `*.istio.io` custom resource definition afterwards.
    #[serde(default)]
    pub delete_crds: bool,

    /// How long Helm waits for each release to be removed.
    #[serde(default = "default_helm_timeout")]
    pub timeout: String,
}

impl ToolParams for UninstallIstioParams {
    fn validate(&self) -> Result<(), ToolError> {
        ensure_duration("timeout", &self.timeout)
    }
}

/// Removes the Istio releases in reverse install order.
pub struct UninstallIstioTool;

async fn delete_istio_crds(ctx: &ToolContext) -> ClusterResult<usize> {
    let crds: Vec<String> = ctx
        .cluster
        .list_crds()
        .await?
        .into_iter()
        .filter(|name| name.contains("istio.io"))
        .collect();
    for crd in &crds {
        ctx.cluster
            .delete(ResourceKind::CustomResourceDefinition, None, crd)
            .await?;
    }
    Ok(crds.len())
}

#[async_trait]
impl ToolDefinition for UninstallIstioTool {
    const NAME: &'static str = "uninstall_istio";
    const DESCRIPTION: &'static str = "Uninstall Istio service mesh from the cluster using Helm";

    type Params = UninstallIstioParams;

    #[instrument(skip_all, fields(namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let helm = &ctx.helm;

        if let Err(e) = helm.ensure_available().await {
            return ToolError::execution_failed(format!(
                "Helm is not available: {}. Please install Helm to use this feature.",
                e
            ))
            .into_result();
        }

        let release =
            |name: &str, ns: &str| UninstallRequest::new(name, ns, params.timeout.as_str());
        let mut messages = Vec::new();

        let gateway = helm
            .uninstall(&release(GATEWAY_RELEASE, &params.gateway_namespace))
            .await;
        match gateway {
            Err(e) if !e.is_not_found() => {
                warn!("Failed to uninstall Istio gateway: {}", e);
                messages.push("Warning: Gateway uninstall failed".to_string());
            }
            _ => messages.push(format!(
                "Gateway uninstalled from namespace '{}'",
                params.gateway_namespace
            )),
        }

        if let Err(e) = helm.uninstall(&release(ISTIOD_RELEASE, &params.namespace)).await {
            return ToolError::step("Failed to uninstall Istio discovery", e).into_result();
        }
        messages.push("Istio discovery (istiod) uninstalled".to_string());

        if let Err(e) = helm.uninstall(&release(BASE_RELEASE, &params.namespace)).await {
            return ToolError::step("Failed to uninstall Istio base", e).into_result();
        }
        messages.push("Istio base uninstalled".to_string());

        if params.uninstall_cni {
            match helm.uninstall(&release(CNI_RELEASE, &params.namespace)).await {
                Ok(()) => messages.push("Istio CNI uninstalled".to_string()),
                Err(e) => {
                    warn!("Failed to uninstall Istio CNI: {}", e);
                    messages.push("Warning: CNI uninstall failed".to_string());
                }
            }
        }

        if params.delete_crds {
            match delete_istio_crds(ctx).await {
                Ok(count) => {
                    info!("Deleted {} Istio CRDs", count);
                    messages.push("Istio CRDs deleted".to_string());
                }
                Err(e) => {
                    warn!("Failed to delete Istio CRDs: {}", e);
                    messages.push("Warning: Failed to delete Istio CRDs".to_string());
                }
            }
        }

        text_result(format!(
            "Istio successfully uninstalled using Helm. {}",
            messages.join(". ")
        ))
    }
}
