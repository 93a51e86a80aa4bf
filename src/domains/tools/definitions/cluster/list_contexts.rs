//! List contexts tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::domains::tools::definitions::common::json_result;
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

// ============================================================================
// Tool Parameters
// ============================================================================

/// The tool takes no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListContextsParams {}

impl ToolParams for ListContextsParams {}

// ============================================================================
// Output Structure
// ============================================================================

#[derive(Debug, Serialize)]
struct ContextInfo {
    name: String,
    cluster: String,
    user: String,
    namespace: String,
    current: bool,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Lists the contexts defined in the kubeconfig.
pub struct ListContextsTool;

#[async_trait]
impl ToolDefinition for ListContextsTool {
    const NAME: &'static str = "list_contexts";
    const DESCRIPTION: &'static str = "List available Kubernetes contexts";

    type Params = ListContextsParams;

    #[instrument(skip_all)]
    async fn execute(_params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let config = match ctx.cluster.kubeconfig().await {
            Ok(config) => config,
            Err(e) => return ToolError::step("Failed to load kubeconfig", e).into_result(),
        };

        let mut contexts: Vec<ContextInfo> = config
            .contexts
            .iter()
            .map(|c| ContextInfo {
                name: c.name.clone(),
                cluster: c.context.cluster.clone(),
                user: c.context.user.clone(),
                namespace: c.context.namespace.clone().unwrap_or_default(),
                current: c.name == config.current_context,
            })
            .collect();
        contexts.sort_by(|a, b| a.name.cmp(&b.name));

        info!("Found {} contexts", contexts.len());
        json_result(&contexts)
    }
}
