//! Network path tracing tool definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domains::tools::definitions::common::{PodInfo, default_namespace, json_result};
use crate::domains::tools::definitions::connectivity::client_container;
use crate::domains::tools::params::{ensure_range, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

fn default_max_hops() -> u32 {
    30
}

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the path tracing tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TraceNetworkPathParams {
    /// Pod the trace starts from.
    pub source_pod: String,

    /// Namespace of the source pod.
    #[serde(default = "default_namespace")]
    pub source_namespace: String,

    /// Pod to trace to; its IP is used as the destination.
    #[serde(default)]
    pub target_pod: Option<String>,

    /// Namespace of the target pod.
    #[serde(default = "default_namespace")]
    pub target_namespace: String,

    /// Host name or IP to trace to when no target pod is given.
    #[serde(default)]
    pub target_host: Option<String>,

    /// Destination port for the checks.
    #[serde(default)]
    #[schemars(range(min = 1, max = 65535))]
    pub target_port: Option<u16>,

    /// Maximum number of hops.
    #[serde(default = "default_max_hops")]
    #[schemars(range(min = 1, max = 64))]
    pub max_hops: u32,
}

impl TraceNetworkPathParams {
    fn target_pod(&self) -> Option<&str> {
        self.target_pod.as_deref().filter(|p| !p.is_empty())
    }

    fn target_host(&self) -> Option<&str> {
        self.target_host.as_deref().filter(|h| !h.is_empty())
    }
}

impl ToolParams for TraceNetworkPathParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("source_pod", &self.source_pod)?;
        ensure_range("max_hops", self.max_hops, 1, 64)?;
        if let Some(port) = self.target_port {
            ensure_range("target_port", port, 1, u16::MAX)?;
        }
        if self.target_pod().is_none() && self.target_host().is_none() {
            return Err(ToolError::invalid_arguments(
                "Either target_pod or target_host must be specified",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Output Structure
// ============================================================================

#[derive(Debug, Serialize)]
struct NetworkTrace {
    source: PodInfo,
    destination: PodInfo,
    path: Vec<String>,
    success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<String>,
    timestamp: DateTime<Utc>,
}

/// One `hop address (detail)` entry per hop line; banner lines are dropped.
fn parse_hops(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !line.starts_with("traceroute") && !line.starts_with("tracepath")
        })
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [hop, address, detail, ..] => Some(format!("{} {} ({})", hop, address, detail)),
                [hop, address] => Some(format!("{} {}", hop, address)),
                _ => None,
            }
        })
        .collect()
}

fn command(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Traces the route from a pod to another pod or host.
pub struct TraceNetworkPathTool;

impl TraceNetworkPathTool {
    /// Append the source pod's routes and interface addresses to the path.
    async fn add_diagnostics(ctx: &ToolContext, source: &PodInfo, container: &str, trace: &mut NetworkTrace) {
        let routes = ctx
            .cluster
            .exec(&source.namespace, &source.name, container, &command(&["ip", "route"]), None)
            .await;
        match routes {
            Ok(output) => {
                trace.path.push("=== Routing Table ===".to_string());
                trace.path.extend(
                    output
                        .lines()
                        .filter(|line| !line.trim().is_empty())
                        .map(|line| format!("route: {}", line)),
                );
            }
            Err(e) => debug!("ip route unavailable: {}", e),
        }

        let interfaces = ctx
            .cluster
            .exec(&source.namespace, &source.name, container, &command(&["ip", "addr"]), None)
            .await;
        match interfaces {
            Ok(output) => {
                trace.path.push("=== Network Interfaces ===".to_string());
                trace.path.extend(
                    output
                        .lines()
                        .filter(|line| !line.trim().is_empty() && (line.contains("inet") || line.contains("link")))
                        .map(|line| format!("interface: {}", line)),
                );
            }
            Err(e) => debug!("ip addr unavailable: {}", e),
        }
    }
}

#[async_trait]
impl ToolDefinition for TraceNetworkPathTool {
    const NAME: &'static str = "trace_network_path";
    const DESCRIPTION: &'static str = "Trace the network path from a pod to another pod or host, with routing and interface diagnostics";

    type Params = TraceNetworkPathParams;

    #[instrument(skip_all, fields(source = %params.source_pod))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let source_pod = match ctx.cluster.get_pod(&params.source_namespace, &params.source_pod).await {
            Ok(pod) => pod,
            Err(e) => return ToolError::step("Failed to get source pod", e).into_result(),
        };
        let source = PodInfo::from(&source_pod);
        let container = client_container(&source_pod);

        let (host, destination) = match (params.target_pod(), params.target_host()) {
            (Some(target), _) => match ctx.cluster.get_pod(&params.target_namespace, target).await {
                Ok(pod) => {
                    let info = PodInfo::from(&pod);
                    (info.ip.clone(), info)
                }
                Err(e) => return ToolError::step("Failed to get target pod", e).into_result(),
            },
            (None, Some(host)) => (
                host.to_string(),
                PodInfo {
                    name: host.to_string(),
                    ip: host.to_string(),
                    ..Default::default()
                },
            ),
            (None, None) => {
                return ToolError::invalid_arguments("Either target_pod or target_host must be specified")
                    .into_result();
            }
        };

        let mut trace = NetworkTrace {
            source,
            destination,
            path: Vec::new(),
            success: false,
            issues: Vec::new(),
            timestamp: Utc::now(),
        };

        let max_hops = params.max_hops.to_string();
        let mut traceroute = command(&["traceroute", "-n", "-m", max_hops.as_str(), host.as_str()]);
        if let Some(port) = params.target_port {
            traceroute.extend(["-p".to_string(), port.to_string()]);
        }

        let (namespace, pod) = (trace.source.namespace.clone(), trace.source.name.clone());
        let outcome = match ctx.cluster.exec(&namespace, &pod, &container, &traceroute, None).await {
            Ok(output) => Ok(output),
            Err(e) => {
                debug!("traceroute failed, falling back to tracepath: {}", e);
                ctx.cluster
                    .exec(&namespace, &pod, &container, &command(&["tracepath", host.as_str()]), None)
                    .await
            }
        };

        match outcome {
            Ok(output) => {
                trace.success = true;
                trace.path = parse_hops(&output);
            }
            Err(e) => trace.issues.push(format!("Traceroute failed: {}", e)),
        }

        let source = trace.source.clone();
        Self::add_diagnostics(ctx, &source, &container, &mut trace).await;

        json_result(&trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterError;
    use crate::domains::tools::params::decode_params;
    use crate::testing::{FakeCluster, FakeHelm, result_json, result_text, tool_context};
    use serde_json::json;
    use std::sync::Arc;

    const TRACEROUTE: &str = "traceroute to 10.244.0.12 (10.244.0.12), 30 hops max, 46 byte packets\n 1  10.244.0.1  0.041 ms  0.010 ms\n 2  10.244.0.12  0.102 ms\n";

    fn failed(message: &str) -> ClusterError {
        ClusterError::CommandFailed {
            program: "kubectl".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_parse_hops() {
        assert_eq!(
            parse_hops(TRACEROUTE),
            vec!["1 10.244.0.1 (0.041)", "2 10.244.0.12 (0.102)"]
        );
        assert_eq!(parse_hops("tracepath header\n\n 1?\n"), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_trace_to_pod_with_diagnostics() {
        let cluster = Arc::new(FakeCluster::populated());
        cluster.script_exec(Ok(TRACEROUTE.to_string()));
        cluster.script_exec(Ok("default via 10.244.0.1 dev eth0\n".to_string()));
        cluster.script_exec(Ok("2: eth0@if7: <UP>\n    link/ether aa:bb\n    inet 10.244.0.12/24\n    mtu\n".to_string()));
        let ctx = tool_context(cluster.clone(), Arc::new(FakeHelm::default()));
        let params = decode_params(json!({
            "source_pod": "sleep-1",
            "target_pod": "httpbin-1",
            "target_port": 8000,
            "max_hops": 5
        }))
        .unwrap();

        let body = result_json(&TraceNetworkPathTool::execute(params, &ctx).await);

        assert_eq!(body["success"], true);
        assert_eq!(body["destination"]["name"], "httpbin-1");
        let path: Vec<&str> = body["path"].as_array().unwrap().iter().map(|p| p.as_str().unwrap()).collect();
        assert_eq!(
            path,
            vec![
                "1 10.244.0.1 (0.041)",
                "2 10.244.0.12 (0.102)",
                "=== Routing Table ===",
                "route: default via 10.244.0.1 dev eth0",
                "=== Network Interfaces ===",
                "interface:     link/ether aa:bb",
                "interface:     inet 10.244.0.12/24",
            ]
        );

        let executed = cluster.executed.lock().unwrap().clone();
        assert_eq!(executed[0].0, "sleep");
        assert_eq!(
            executed[0].1,
            vec!["traceroute", "-n", "-m", "5", "10.244.0.12", "-p", "8000"]
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_tracepath_then_reports_issue() {
        let cluster = Arc::new(FakeCluster::populated());
        cluster.script_exec(Err(failed("traceroute: not found")));
        cluster.script_exec(Err(failed("tracepath: not found")));
        let ctx = tool_context(cluster.clone(), Arc::new(FakeHelm::default()));
        let params = decode_params(json!({"source_pod": "sleep-1", "target_host": "httpbin"})).unwrap();

        let body = result_json(&TraceNetworkPathTool::execute(params, &ctx).await);

        assert_eq!(body["success"], false);
        assert!(body["issues"][0].as_str().unwrap().starts_with("Traceroute failed: "));
        assert_eq!(body["destination"]["ip"], "httpbin");
        let executed = cluster.executed.lock().unwrap().clone();
        assert_eq!(executed[1].1, vec!["tracepath", "httpbin"]);
    }

    #[tokio::test]
    async fn test_missing_target_pod() {
        let ctx = tool_context(Arc::new(FakeCluster::populated()), Arc::new(FakeHelm::default()));
        let params = decode_params(json!({"source_pod": "sleep-1", "target_pod": "ghost"})).unwrap();

        let result = TraceNetworkPathTool::execute(params, &ctx).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).starts_with("Failed to get target pod"));
    }

    #[test]
    fn test_target_required() {
        let err = decode_params::<TraceNetworkPathParams>(json!({"source_pod": "sleep-1"})).unwrap_err();
        assert!(err.to_string().contains("Either target_pod or target_host must be specified"));
    }
}
