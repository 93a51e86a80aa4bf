//! Switch context tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::domains::tools::definitions::common::text_result;
use crate::domains::tools::params::require_non_empty;
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

/// Parameters for the switch context tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwitchContextParams {
    /// Name of the context to make current.
    pub context: String,
}

impl ToolParams for SwitchContextParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("context", &self.context)
    }
}

/// Persists a new current context in the kubeconfig.
///
/// The running server keeps every call pinned to the context it connected
/// with; the switch takes effect for this server on restart.
pub struct SwitchContextTool;

#[async_trait]
impl ToolDefinition for SwitchContextTool {
    const NAME: &'static str = "switch_context";
    const DESCRIPTION: &'static str = "Switch to a different Kubernetes context";

    type Params = SwitchContextParams;

    #[instrument(skip_all, fields(context = %params.context))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let config = match ctx.cluster.kubeconfig().await {
            Ok(config) => config,
            Err(e) => return ToolError::step("Failed to get kubeconfig", e).into_result(),
        };

        if config.context(&params.context).is_none() {
            return ToolError::execution_failed(format!(
                "Context '{}' does not exist",
                params.context
            ))
            .into_result();
        }

        if let Err(e) = ctx.cluster.use_context(&params.context).await {
            return ToolError::step("Failed to switch context", e).into_result();
        }
        info!("Current context set to '{}'", params.context);

        let mut message = format!("Successfully switched to context: {}", params.context);
        let bound = ctx.cluster.context_name();
        if bound != params.context {
            message.push_str(&format!(
                ". This server stays bound to context '{}' until it is restarted.",
                bound
            ));
        }
        text_result(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCluster, FakeHelm, result_text, tool_context};
    use std::sync::Arc;

    fn params(context: &str) -> SwitchContextParams {
        SwitchContextParams {
            context: context.to_string(),
        }
    }

    #[tokio::test]
    async fn test_switch_persists_context() {
        let cluster = Arc::new(FakeCluster::populated());
        let ctx = tool_context(cluster.clone(), Arc::new(FakeHelm::default()));
        let result = SwitchContextTool::execute(params("kind-edge"), &ctx).await;

        assert_eq!(result.is_error, Some(false));
        assert!(result_text(&result).starts_with("Successfully switched to context: kind-edge"));
        assert!(result_text(&result).contains("until it is restarted"));
        assert_eq!(cluster.used_context.lock().unwrap().as_deref(), Some("kind-edge"));
    }

    #[tokio::test]
    async fn test_unknown_context_rejected() {
        let cluster = Arc::new(FakeCluster::populated());
        let ctx = tool_context(cluster.clone(), Arc::new(FakeHelm::default()));
        let result = SwitchContextTool::execute(params("prod"), &ctx).await;

        assert_eq!(result.is_error, Some(true));
        assert_eq!(result_text(&result), "Context 'prod' does not exist");
        assert!(cluster.used_context.lock().unwrap().is_none());
    }

    #[test]
    fn test_empty_context_is_missing() {
        assert!(params(" ").validate().is_err());
    }
}
