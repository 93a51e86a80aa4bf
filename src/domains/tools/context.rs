//! Per-process state handed to every tool, and the trait tools implement.

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::{CallToolResult, JsonObject};
use std::sync::Arc;

use super::params::ToolParams;
use crate::cluster::{ClusterClient, CommandRunner, HelmCli, KubectlClient, PackageManager};
use crate::core::config::ClusterConfig;

/// The collaborators a tool may use.
///
/// Built once at startup and shared read-only; a tool receives no ambient
/// state beyond this and its decoded arguments.
pub struct ToolContext {
    pub cluster: Arc<dyn ClusterClient>,
    pub helm: Arc<dyn PackageManager>,
    pub settings: ClusterConfig,
}

impl ToolContext {
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        helm: Arc<dyn PackageManager>,
        settings: ClusterConfig,
    ) -> Self {
        Self {
            cluster,
            helm,
            settings,
        }
    }

    /// Bind `kubectl` and `helm` to the configured (or current) context.
    pub async fn connect(
        settings: &ClusterConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> crate::Result<Self> {
        let cluster = KubectlClient::connect(runner.clone(), settings).await?;
        let context = cluster.context_name().to_string();
        let helm = HelmCli::new(runner, settings, context);
        Ok(Self::new(Arc::new(cluster), Arc::new(helm), settings.clone()))
    }
}

/// A single tool: its identity, its argument struct and its behavior.
#[async_trait]
pub trait ToolDefinition: Send + Sync + 'static {
    /// Tool name as registered in MCP.
    const NAME: &'static str;

    /// Tool description shown to clients.
    const DESCRIPTION: &'static str;

    type Params: ToolParams;

    /// Run the tool. Failures are reported inside the result, never raised.
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult;
}

/// JSON schema advertised for a tool's arguments.
pub fn tool_schema<T: ToolDefinition>() -> Arc<JsonObject> {
    cached_schema_for_type::<T::Params>()
}
