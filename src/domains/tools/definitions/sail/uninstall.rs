//! Uninstall Sail operator tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{default_release_name, default_sail_namespace};
use crate::cluster::UninstallRequest;
use crate::domains::tools::definitions::common::{default_helm_timeout, text_result};
use crate::domains::tools::params::{ensure_duration, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

/// Parameters for the Sail operator uninstall tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UninstallSailOperatorParams {
    /// Namespace of the operator.
    #[serde(default = "default_sail_namespace")]
    pub namespace: String,

    /// Helm release name.
    #[serde(default = "default_release_name")]
    pub release_name: String,

    /// How long Helm waits for the release to be removed.
    #[serde(default = "default_helm_timeout")]
    pub timeout: String,
}

impl ToolParams for UninstallSailOperatorParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("release_name", &self.release_name)?;
        ensure_duration("timeout", &self.timeout)
    }
}

pub struct UninstallSailOperatorTool;

#[async_trait]
impl ToolDefinition for UninstallSailOperatorTool {
    const NAME: &'static str = "uninstall_sail_operator";
    const DESCRIPTION: &'static str = "Uninstall the Sail operator using Helm";

    type Params = UninstallSailOperatorParams;

    #[instrument(skip_all, fields(namespace = %params.namespace, release = %params.release_name))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        if let Err(e) = ctx.helm.ensure_available().await {
            return ToolError::execution_failed(format!(
                "Helm is not available: {}. Please install Helm to use this feature.",
                e
            ))
            .into_result();
        }

        let request = UninstallRequest::new(
            params.release_name.as_str(),
            params.namespace.as_str(),
            params.timeout.as_str(),
        );
        if let Err(e) = ctx.helm.uninstall(&request).await {
            return ToolError::step("Failed to uninstall Sail operator with Helm", e).into_result();
        }

        text_result(format!(
            "Sail operator successfully uninstalled from namespace '{}' (release: {})",
            params.namespace, params.release_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::params::decode_params;
    use crate::testing::{FakeCluster, FakeHelm, result_text, tool_context};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_missing_release_is_an_error() {
        let helm = Arc::new(FakeHelm {
            missing_releases: vec!["sail".to_string()],
            ..Default::default()
        });
        let ctx = tool_context(Arc::new(FakeCluster::default()), helm.clone());
        let params: UninstallSailOperatorParams =
            decode_params(json!({"release_name": "sail"})).unwrap();

        let result = UninstallSailOperatorTool::execute(params, &ctx).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).starts_with("Failed to uninstall Sail operator with Helm:"));
        assert_eq!(helm.uninstalled(), vec!["sail"]);
    }
}
