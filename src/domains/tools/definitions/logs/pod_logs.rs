//! Pod logs tool definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::cluster::LogRequest;
use crate::domains::tools::definitions::common::{default_namespace, json_result, pick_container};
use crate::domains::tools::params::{ensure_duration, ensure_range, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

// ============================================================================
// Tool Parameters
// ============================================================================

pub(super) fn default_lines() -> u64 {
    100
}

fn default_max_lines() -> usize {
    1000
}

/// Parameters for the pod logs tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetPodLogsParams {
    /// Pod to read logs from.
    pub pod_name: String,

    /// Namespace of the pod.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Container to read (the pod's first container when omitted).
    #[serde(default)]
    pub container: Option<String>,

    /// Number of most recent lines to request.
    #[serde(default = "default_lines")]
    #[schemars(range(min = 1, max = 10000))]
    pub lines: u64,

    /// Only return logs newer than this duration (e.g. `30m`, `1h`).
    #[serde(default)]
    pub since: Option<String>,

    /// Read the previous instance of the container.
    #[serde(default)]
    pub previous: bool,

    /// Split lines into timestamp, level and message.
    #[serde(default)]
    pub parse_logs: bool,

    /// Upper bound on lines returned.
    #[serde(default = "default_max_lines")]
    #[schemars(range(min = 1, max = 100000))]
    pub max_lines: usize,
}

impl ToolParams for GetPodLogsParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("pod_name", &self.pod_name)?;
        ensure_range("lines", self.lines, 1, 10_000)?;
        ensure_range("max_lines", self.max_lines, 1, 100_000)?;
        if let Some(since) = self.since.as_deref().filter(|s| !s.is_empty()) {
            ensure_duration("since", since)?;
        }
        Ok(())
    }
}

// ============================================================================
// Output Structure
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct LogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<&'static str>,
    pub message: String,
    pub container: String,
    pub pod: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LogResult {
    pub pod: String,
    pub namespace: String,
    pub container: String,
    pub lines: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<LogEntry>,
    pub raw_logs: String,
    pub truncated: bool,
}

/// Keyword-based level detection; the first matching keyword wins.
pub(crate) fn detect_level(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    if lower.contains("err") {
        Some("error")
    } else if lower.contains("warn") {
        Some("warning")
    } else if lower.contains("info") {
        Some("info")
    } else if lower.contains("debug") {
        Some("debug")
    } else {
        None
    }
}

/// Split a `kubectl logs --timestamps` line into its parts.
fn parse_line(line: &str, result: &LogResult) -> Option<LogEntry> {
    if line.is_empty() {
        return None;
    }

    let bytes = line.as_bytes();
    let mut timestamp = None;
    let mut message = line;
    if bytes.len() > 30 && bytes[10] == b'T' && bytes[19] == b'.' {
        if let Some(parsed) = line
            .get(..30)
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        {
            timestamp = Some(parsed.with_timezone(&Utc));
            message = line.get(31..).unwrap_or_default();
        }
    }

    Some(LogEntry {
        timestamp,
        level: detect_level(message),
        message: message.to_string(),
        container: result.container.clone(),
        pod: result.pod.clone(),
        namespace: result.namespace.clone(),
    })
}

/// What to read and how to shape it.
pub(crate) struct LogQuery<'a> {
    pub pod: &'a str,
    pub namespace: &'a str,
    pub container: Option<&'a str>,
    pub lines: u64,
    pub since: Option<&'a str>,
    pub previous: bool,
    pub parse: bool,
    pub max_lines: usize,
}

/// Read and shape the logs of one container.
pub(crate) async fn collect_logs(ctx: &ToolContext, query: LogQuery<'_>) -> Result<LogResult, ToolError> {
    let pod = ctx
        .cluster
        .get_pod(query.namespace, query.pod)
        .await
        .map_err(|e| ToolError::step("Failed to get pod", e))?;
    let container = pick_container(&pod, query.container)?;

    let request = LogRequest {
        container: container.clone(),
        tail_lines: query.lines,
        since: query.since.filter(|s| !s.is_empty()).map(str::to_string),
        previous: query.previous,
        timestamps: true,
    };
    let logs = ctx
        .cluster
        .pod_logs(query.namespace, query.pod, &request)
        .await
        .map_err(|e| ToolError::step("Failed to get logs", e))?;

    let mut result = LogResult {
        pod: query.pod.to_string(),
        namespace: query.namespace.to_string(),
        container,
        lines: 0,
        entries: Vec::new(),
        raw_logs: String::new(),
        truncated: false,
    };

    for line in logs.lines().take(query.max_lines) {
        result.raw_logs.push_str(line);
        result.raw_logs.push('\n');
        result.lines += 1;
        if query.parse {
            if let Some(entry) = parse_line(line, &result) {
                result.entries.push(entry);
            }
        }
    }
    result.truncated = result.lines >= query.max_lines;
    debug!("Read {} log lines from {}/{}", result.lines, query.pod, result.container);

    Ok(result)
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Reads recent logs of a pod's container.
pub struct GetPodLogsTool;

#[async_trait]
impl ToolDefinition for GetPodLogsTool {
    const NAME: &'static str = "get_pod_logs";
    const DESCRIPTION: &'static str = "Get logs from a pod container, optionally parsed into timestamped entries";

    type Params = GetPodLogsParams;

    #[instrument(skip_all, fields(pod = %params.pod_name, namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let query = LogQuery {
            pod: &params.pod_name,
            namespace: &params.namespace,
            container: params.container.as_deref(),
            lines: params.lines,
            since: params.since.as_deref(),
            previous: params.previous,
            parse: params.parse_logs,
            max_lines: params.max_lines,
        };
        match collect_logs(ctx, query).await {
            Ok(result) => json_result(&result),
            Err(e) => e.into_result(),
        }
    }
}
