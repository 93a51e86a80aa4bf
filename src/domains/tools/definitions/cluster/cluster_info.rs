//! Cluster info tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::domains::tools::definitions::common::json_result;
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

/// The tool takes no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetClusterInfoParams {}

impl ToolParams for GetClusterInfoParams {}

#[derive(Debug, Serialize)]
struct ClusterInfo {
    name: String,
    server: String,
    version: String,
    nodes: usize,
    namespaces: Vec<String>,
    context: String,
}

/// Reports server version, node count and namespaces of the bound cluster.
pub struct GetClusterInfoTool;

#[async_trait]
impl ToolDefinition for GetClusterInfoTool {
    const NAME: &'static str = "get_cluster_info";
    const DESCRIPTION: &'static str = "Get information about the current Kubernetes cluster";

    type Params = GetClusterInfoParams;

    #[instrument(skip_all)]
    async fn execute(_params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let cluster = &ctx.cluster;

        let version = match cluster.server_version().await {
            Ok(version) => version,
            Err(e) => return ToolError::step("Failed to get server version", e).into_result(),
        };
        let nodes = match cluster.list_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => return ToolError::step("Failed to get nodes", e).into_result(),
        };
        let namespaces = match cluster.list_namespaces().await {
            Ok(namespaces) => namespaces,
            Err(e) => return ToolError::step("Failed to get namespaces", e).into_result(),
        };

        let context = cluster.context_name().to_string();
        let server = match cluster.kubeconfig().await {
            Ok(config) => config.server_for(&context).unwrap_or_default().to_string(),
            Err(e) => {
                warn!("Could not read API server address: {}", e);
                String::new()
            }
        };

        json_result(&ClusterInfo {
            name: context.clone(),
            server,
            version,
            nodes: nodes.len(),
            namespaces: namespaces.into_iter().map(|n| n.metadata.name).collect(),
            context,
        })
    }
}
