//! Connectivity test tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

use super::attempt::{client_container, curl_command, run_attempt};
use crate::domains::tools::definitions::common::{PodInfo, default_namespace, json_result};
use crate::domains::tools::params::{ensure_range, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
    Tcp,
}

impl Protocol {
    fn is_http(&self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Tcp => "tcp",
        })
    }
}

fn default_path() -> String {
    "/".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_method() -> String {
    "GET".to_string()
}

/// Parameters for the connectivity test tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TestConnectivityParams {
    /// Pod to run the check from.
    pub source_pod: String,

    /// Namespace of the source pod.
    #[serde(default = "default_namespace")]
    pub source_namespace: String,

    /// Service host name or address to reach.
    pub target_service: String,

    /// Port on the target.
    #[schemars(range(min = 1, max = 65535))]
    pub target_port: u16,

    /// Protocol to check with.
    #[serde(default)]
    pub protocol: Protocol,

    /// Request path for HTTP checks.
    #[serde(default = "default_path")]
    pub path: String,

    /// Connect timeout in seconds.
    #[serde(default = "default_timeout")]
    #[schemars(range(min = 1, max = 300))]
    pub timeout: u32,

    /// HTTP method for HTTP checks.
    #[serde(default = "default_method")]
    pub method: String,
}

impl ToolParams for TestConnectivityParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("source_pod", &self.source_pod)?;
        require_non_empty("target_service", &self.target_service)?;
        ensure_range("target_port", self.target_port, 1, u16::MAX)?;
        ensure_range("timeout", self.timeout, 1, 300)
    }
}

impl TestConnectivityParams {
    fn command(&self) -> Vec<String> {
        match self.protocol {
            Protocol::Http | Protocol::Https => {
                let url = format!(
                    "{}://{}:{}{}",
                    self.protocol, self.target_service, self.target_port, self.path
                );
                curl_command(&url, Some(&self.method), self.timeout)
            }
            Protocol::Tcp => vec![
                "nc".to_string(),
                "-z".to_string(),
                "-v".to_string(),
                "-w".to_string(),
                self.timeout.to_string(),
                self.target_service.clone(),
                self.target_port.to_string(),
            ],
        }
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Checks a service from inside a pod with curl or netcat.
pub struct TestConnectivityTool;

#[async_trait]
impl ToolDefinition for TestConnectivityTool {
    const NAME: &'static str = "test_connectivity";
    const DESCRIPTION: &'static str = "Test network connectivity from a pod to a service over HTTP, HTTPS or TCP";

    type Params = TestConnectivityParams;

    #[instrument(skip_all, fields(source = %params.source_pod, target = %params.target_service))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let pod = match ctx
            .cluster
            .get_pod(&params.source_namespace, &params.source_pod)
            .await
        {
            Ok(pod) => pod,
            Err(e) => return ToolError::step("Failed to get source pod", e).into_result(),
        };

        let source = PodInfo::from(&pod);
        let destination = PodInfo {
            name: params.target_service.clone(),
            ip: params.target_service.clone(),
            ..Default::default()
        };
        let exec_timeout = Duration::from_secs(u64::from(params.timeout) + 5);

        let result = run_attempt(
            ctx,
            &source,
            &client_container(&pod),
            destination,
            params.command(),
            params.protocol.is_http(),
            exec_timeout,
        )
        .await;

        let status = if result.success { "SUCCESS" } else { "FAILED" };
        info!("{} check {}", params.protocol, status);

        json_result(&json!({
            "summary": format!(
                "Connectivity test from {} to {}: {}",
                result.source.name, result.destination.name, status
            ),
            "results": [result],
        }))
    }
}
