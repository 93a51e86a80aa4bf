//! Istio sidecar logs tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::pod_logs::{LogQuery, collect_logs, default_lines};
use crate::domains::tools::definitions::common::{default_namespace, json_result};
use crate::domains::tools::params::{ensure_duration, ensure_range, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

const PROXY_CONTAINER: &str = "istio-proxy";
const PROXY_MAX_LINES: usize = 1000;

/// Severity used to narrow parsed proxy entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[serde(alias = "warn")]
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Parameters for the Istio proxy logs tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetIstioProxyLogsParams {
    /// Pod whose sidecar logs are read.
    pub pod_name: String,

    /// Namespace of the pod.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Number of most recent lines to request.
    #[serde(default = "default_lines")]
    #[schemars(range(min = 1, max = 10000))]
    pub lines: u64,

    /// Only return logs newer than this duration (e.g. `30m`, `1h`).
    #[serde(default)]
    pub since: Option<String>,

    /// Keep only entries detected at this level.
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

impl ToolParams for GetIstioProxyLogsParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("pod_name", &self.pod_name)?;
        ensure_range("lines", self.lines, 1, 10_000)?;
        if let Some(since) = self.since.as_deref().filter(|s| !s.is_empty()) {
            ensure_duration("since", since)?;
        }
        Ok(())
    }
}

/// Reads the `istio-proxy` sidecar's logs, always parsed.
pub struct GetIstioProxyLogsTool;

#[async_trait]
impl ToolDefinition for GetIstioProxyLogsTool {
    const NAME: &'static str = "get_istio_proxy_logs";
    const DESCRIPTION: &'static str = "Get parsed logs from the istio-proxy sidecar of a pod, optionally filtered by level";

    type Params = GetIstioProxyLogsParams;

    #[instrument(skip_all, fields(pod = %params.pod_name, namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let query = LogQuery {
            pod: &params.pod_name,
            namespace: &params.namespace,
            container: Some(PROXY_CONTAINER),
            lines: params.lines,
            since: params.since.as_deref(),
            previous: false,
            parse: true,
            max_lines: PROXY_MAX_LINES,
        };
        let mut result = match collect_logs(ctx, query).await {
            Ok(result) => result,
            Err(e) => return e.into_result(),
        };

        if let Some(level) = params.log_level {
            result
                .entries
                .retain(|entry| entry.level == Some(level.as_str()));
        }

        json_result(&result)
    }
}
