//! Install Sail operator tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{instrument, warn};

use super::status::sail_status;
use super::{SAIL_CHART, SAIL_REPO, default_release_name, default_sail_namespace};
use crate::cluster::InstallRequest;
use crate::domains::tools::definitions::common::{default_helm_timeout, text_result};
use crate::domains::tools::params::{ensure_duration, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

/// Parameters for the Sail operator install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallSailOperatorParams {
    /// Namespace for the operator.
    #[serde(default = "default_sail_namespace")]
    pub namespace: String,

    /// Helm release name.
    #[serde(default = "default_release_name")]
    pub release_name: String,

    /// Chart version (latest when omitted).
    #[serde(default)]
    pub version: Option<String>,

    /// Helm values, keyed by top-level value name.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,

    /// How long Helm waits for the operator to become ready.
    #[serde(default = "default_helm_timeout")]
    pub timeout: String,
}

impl ToolParams for InstallSailOperatorParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("release_name", &self.release_name)?;
        ensure_duration("timeout", &self.timeout)
    }
}

pub struct InstallSailOperatorTool;

#[async_trait]
impl ToolDefinition for InstallSailOperatorTool {
    const NAME: &'static str = "install_sail_operator";
    const DESCRIPTION: &'static str = "Install the Sail operator (Istio lifecycle operator) using Helm";

    type Params = InstallSailOperatorParams;

    #[instrument(skip_all, fields(namespace = %params.namespace, release = %params.release_name))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let helm = &ctx.helm;

        if let Err(e) = helm.ensure_available().await {
            return ToolError::execution_failed(format!(
                "Helm is not available: {}. Please install Helm to use this feature.",
                e
            ))
            .into_result();
        }

        if let Err(e) = helm.add_repo(&SAIL_REPO).await {
            return ToolError::step("Failed to add Sail operator Helm repository", e).into_result();
        }

        let request = InstallRequest::new(
            params.release_name.as_str(),
            SAIL_CHART,
            params.namespace.as_str(),
            params.timeout.as_str(),
        )
        .create_namespace()
        .version(params.version.clone())
        .values(params.values.clone());

        if let Err(e) = helm.install(&request).await {
            return ToolError::step("Failed to install Sail operator with Helm", e).into_result();
        }

        let mut message = format!(
            "Sail operator successfully installed using Helm in namespace '{}' with release name '{}'",
            params.namespace, params.release_name
        );
        if let Some(version) = params.version.as_deref().filter(|v| !v.is_empty()) {
            message.push_str(&format!(" (version: {})", version));
        }

        let ready = match sail_status(ctx, &params.namespace).await {
            Ok(status) => status.ready,
            Err(e) => {
                warn!("Failed to verify Sail operator installation: {}", e);
                false
            }
        };
        if ready {
            message.push_str(". Operator is ready and running.");
        } else {
            message.push_str(". Use check_sail_status to monitor the deployment status.");
        }

        text_result(message)
    }
}
