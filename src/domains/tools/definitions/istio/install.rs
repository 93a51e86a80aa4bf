//! Install Istio tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use super::status::istio_status;
use super::{
    BASE_RELEASE, CNI_RELEASE, GATEWAY_RELEASE, ISTIO_REPO, ISTIOD_RELEASE,
    default_gateway_namespace, default_istio_namespace,
};
use crate::cluster::InstallRequest;
use crate::domains::tools::definitions::common::{default_helm_timeout, text_result};
use crate::domains::tools::params::ensure_duration;
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the Istio install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallIstioParams {
    /// Namespace for the control plane.
    #[serde(default = "default_istio_namespace")]
    pub namespace: String,

    /// Chart version to install (latest when omitted).
    #[serde(default)]
    pub version: Option<String>,

    /// Helm values for the istiod chart, keyed by top-level value name.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,

    /// Also install the ingress gateway.
    #[serde(default)]
    pub install_gateway: bool,

    /// Namespace for the ingress gateway.
    #[serde(default = "default_gateway_namespace")]
    pub gateway_namespace: String,

    /// Install the Istio CNI node agent (removes the need for init containers).
    #[serde(default)]
    pub install_cni: bool,

    /// Helm values for the CNI chart.
    #[serde(default)]
    pub cni_values: BTreeMap<String, Value>,

    /// How long Helm waits for each release to become ready (e.g. `5m`).
    #[serde(default = "default_helm_timeout")]
    pub timeout: String,
}

impl ToolParams for InstallIstioParams {
    fn validate(&self) -> Result<(), ToolError> {
        ensure_duration("timeout", &self.timeout)
    }
}

/// Force `pilot.cni.enabled = true` into the istiod values.
///
/// A `pilot` entry that is not an object is left as the caller gave it.
fn enable_cni(values: &mut BTreeMap<String, Value>) {
    let pilot = values
        .entry("pilot".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(pilot) = pilot.as_object_mut() {
        let cni = pilot
            .entry("cni")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(cni) = cni.as_object_mut() {
            cni.insert("enabled".to_string(), json!(true));
        }
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Installs base, istiod and optionally CNI and an ingress gateway.
pub struct InstallIstioTool;

#[async_trait]
impl ToolDefinition for InstallIstioTool {
    const NAME: &'static str = "install_istio";
    const DESCRIPTION: &'static str = "Install Istio service mesh on the cluster using Helm";

    type Params = InstallIstioParams;

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

        if let Err(e) = helm.add_repo(&ISTIO_REPO).await {
            return ToolError::step("Failed to add Istio Helm repository", e).into_result();
        }

        let namespace = params.namespace.as_str();
        let chart = |release: &str, name: &str, ns: &str| {
            InstallRequest::new(release, format!("{}/{}", ISTIO_REPO.name, name), ns, &params.timeout)
                .version(params.version.clone())
        };

        if params.install_cni {
            let cni = chart(CNI_RELEASE, "cni", namespace).values(params.cni_values.clone());
            if let Err(e) = helm.install(&cni).await {
                return ToolError::step("Failed to install Istio CNI", e).into_result();
            }
            info!("Istio CNI installed in {}", namespace);
        }

        let base = chart(BASE_RELEASE, "base", namespace).create_namespace();
        if let Err(e) = helm.install(&base).await {
            return ToolError::step("Failed to install Istio base chart", e).into_result();
        }

        let mut istiod_values = params.values.clone();
        if params.install_cni {
            enable_cni(&mut istiod_values);
        }
        let istiod = chart(ISTIOD_RELEASE, "istiod", namespace).values(istiod_values);
        if let Err(e) = helm.install(&istiod).await {
            return ToolError::step("Failed to install Istio discovery chart", e).into_result();
        }

        let mut message = format!("Istio successfully installed using Helm in namespace '{}'", namespace);
        if let Some(version) = params.version.as_deref().filter(|v| !v.is_empty()) {
            message.push_str(&format!(" (version: {})", version));
        }
        if params.install_cni {
            message.push_str(" with CNI node agent");
        }

        if params.install_gateway {
            let gateway = chart(GATEWAY_RELEASE, "gateway", &params.gateway_namespace).create_namespace();
            match helm.install(&gateway).await {
                Ok(()) => message.push_str(&format!(
                    ". Ingress gateway installed in namespace '{}'.",
                    params.gateway_namespace
                )),
                Err(e) => {
                    warn!("Failed to install Istio gateway: {}", e);
                    message.push_str(". Warning: Gateway installation failed.");
                }
            }
        }

        let ready = match istio_status(ctx, namespace).await {
            Ok(status) => status.installed,
            Err(e) => {
                warn!("Failed to verify Istio installation: {}", e);
                false
            }
        };
        if ready {
            message.push_str(" Istio control plane is ready.");
        } else {
            message.push_str(" Use check_istio_status to monitor the deployment status.");
        }

        text_result(message)
    }
}
