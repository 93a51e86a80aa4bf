//! MCP Server implementation.
//!
//! `McpServer` is what every front-end talks to: it carries the server's
//! identity, advertises the tool catalog and hands tool calls to the
//! dispatcher. It holds no per-connection state and is cheap to clone.

use rmcp::model::{
    CallToolResult, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::tools::{ToolDispatcher, all_tools};

const INSTRUCTIONS: &str = "MeshPilot exposes Kubernetes and Istio operations as tools: \
install and inspect the mesh, deploy sample workloads, test connectivity and \
inspect logs, iptables rules, network policies and routes.";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Routes tool calls to their handlers.
    dispatcher: ToolDispatcher,
}

impl McpServer {
    /// Create a new MCP server with the given configuration and dispatcher.
    pub fn new(config: Config, dispatcher: ToolDispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Answer to `initialize`.
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    /// The full tool catalog, in registry order.
    pub fn list_tools(&self) -> Vec<Tool> {
        all_tools()
    }

    /// Call a tool by name. Failures come back as error results.
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        info!("Calling tool {}", name);
        self.dispatcher.execute(name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RunMode;
    use crate::testing::result_text;
    use serde_json::json;

    fn server() -> McpServer {
        McpServer::new(Config::for_mode(RunMode::Protocol), ToolDispatcher::unavailable())
    }

    #[test]
    fn test_info_advertises_tools_only() {
        let info = server().info();
        assert_eq!(info.server_info.name, "meshpilot");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
    }

    #[test]
    fn test_catalog_available_without_cluster() {
        let tools = server().list_tools();
        assert_eq!(tools.len(), 21);
        assert!(tools.iter().any(|t| t.name == "trace_network_path"));
    }

    #[tokio::test]
    async fn test_call_without_cluster() {
        let result = server().call_tool("list_contexts", json!({})).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).contains("Kubernetes client not available"));
    }
}
