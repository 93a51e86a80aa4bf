//! iptables rules tool definition.
//!
//! Application containers rarely ship `iptables`, and reading the rules
//! needs `NET_ADMIN`. Each table is therefore dumped by its own ephemeral
//! debug container, whose output is collected from that container's logs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, instrument, warn};

use crate::cluster::{DebugRequest, LogRequest};
use crate::domains::tools::definitions::common::{default_namespace, json_result};
use crate::domains::tools::params::{require_items, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

const SIDECAR_CONTAINER: &str = "istio-proxy";
const DEBUG_LOG_LINES: u64 = 100_000;

/// An iptables table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IptablesTable {
    Filter,
    Nat,
    Mangle,
    Raw,
    Security,
}

impl IptablesTable {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Nat => "nat",
            Self::Mangle => "mangle",
            Self::Raw => "raw",
            Self::Security => "security",
        }
    }
}

impl fmt::Display for IptablesTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_tables() -> Vec<IptablesTable> {
    vec![IptablesTable::Filter, IptablesTable::Nat, IptablesTable::Mangle]
}

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the iptables rules tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetIptablesRulesParams {
    /// Pod whose network namespace is inspected.
    pub pod_name: String,

    /// Namespace of the pod.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Container reported alongside the rules (istio-proxy when present).
    #[serde(default)]
    pub container: Option<String>,

    /// Tables to list.
    #[serde(default = "default_tables")]
    pub tables: Vec<IptablesTable>,

    /// Include packet counters and rule numbers.
    #[serde(default)]
    pub verbose: bool,
}

impl ToolParams for GetIptablesRulesParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("pod_name", &self.pod_name)?;
        require_items("tables", &self.tables)
    }
}

// ============================================================================
// Output Structure
// ============================================================================

#[derive(Debug, Serialize)]
struct IptablesRules {
    pod: String,
    namespace: String,
    container: String,
    tables: BTreeMap<IptablesTable, String>,
    timestamp: DateTime<Utc>,
}

fn iptables_command(table: IptablesTable, verbose: bool) -> Vec<String> {
    let mut command = vec!["iptables-nft", "-t", table.as_str(), "-L"];
    if verbose {
        command.extend(["-v", "-n", "--line-numbers"]);
    } else {
        command.push("-n");
    }
    command.into_iter().map(str::to_string).collect()
}

/// Start a debug container listing one table and wait for its output.
async fn dump_table(
    ctx: &ToolContext,
    namespace: &str,
    pod: &str,
    table: IptablesTable,
    verbose: bool,
) -> Result<String, ToolError> {
    let request = DebugRequest {
        container_name: format!("debug-iptables-{}-{}", Utc::now().timestamp(), table),
        image: ctx.settings.debug_image.clone(),
        command: iptables_command(table, verbose),
    };
    ctx.cluster
        .start_debug_container(namespace, pod, &request)
        .await
        .map_err(|e| ToolError::step("Failed to create debug container", e))?;

    let logs = LogRequest {
        container: request.container_name.clone(),
        tail_lines: DEBUG_LOG_LINES,
        ..Default::default()
    };
    let interval = ctx.settings.debug_poll_interval();
    let poll = async {
        loop {
            match ctx.cluster.pod_logs(namespace, pod, &logs).await {
                Ok(output) if !output.is_empty() => return output,
                Ok(_) => debug!("{} has no output yet", request.container_name),
                Err(e) => debug!("{} not readable yet: {}", request.container_name, e),
            }
            tokio::time::sleep(interval).await;
        }
    };

    tokio::time::timeout(ctx.settings.debug_timeout(), poll)
        .await
        .map_err(|_| {
            ToolError::execution_failed(format!(
                "No output from debug container {} after {}s",
                request.container_name,
                ctx.settings.debug_timeout().as_secs()
            ))
        })
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Lists a pod's iptables rules through ephemeral debug containers.
pub struct GetIptablesRulesTool;

#[async_trait]
impl ToolDefinition for GetIptablesRulesTool {
    const NAME: &'static str = "get_iptables_rules";
    const DESCRIPTION: &'static str = "Get iptables rules from a pod's network namespace using ephemeral debug containers";

    type Params = GetIptablesRulesParams;

    #[instrument(skip_all, fields(pod = %params.pod_name, namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let pod = match ctx.cluster.get_pod(&params.namespace, &params.pod_name).await {
            Ok(pod) => pod,
            Err(e) => return ToolError::step("Failed to get pod", e).into_result(),
        };

        let container = match params.container.as_deref().filter(|c| !c.is_empty()) {
            Some(container) => container.to_string(),
            None if pod.has_container(SIDECAR_CONTAINER) => SIDECAR_CONTAINER.to_string(),
            None => match pod.first_container() {
                Some(container) => container.to_string(),
                None => return ToolError::execution_failed("No containers found in pod").into_result(),
            },
        };

        let mut tables = BTreeMap::new();
        for table in params.tables.iter().copied() {
            let rules = match dump_table(ctx, &params.namespace, &params.pod_name, table, params.verbose).await {
                Ok(rules) => rules,
                Err(e) => {
                    warn!("Failed to get iptables rules for table {}: {}", table, e);
                    format!("Error: {}", e)
                }
            };
            tables.insert(table, rules);
        }

        json_result(&IptablesRules {
            pod: params.pod_name,
            namespace: params.namespace,
            container,
            tables,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::params::decode_params;
    use crate::testing::{FakeCluster, FakeHelm, result_json, result_text, tool_context};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_command_shapes() {
        assert_eq!(
            iptables_command(IptablesTable::Nat, false),
            vec!["iptables-nft", "-t", "nat", "-L", "-n"]
        );
        assert_eq!(
            iptables_command(IptablesTable::Filter, true),
            vec!["iptables-nft", "-t", "filter", "-L", "-v", "-n", "--line-numbers"]
        );
    }

    #[tokio::test]
    async fn test_one_debug_container_per_table() {
        let mut cluster = FakeCluster::populated();
        cluster.logs = "Chain ISTIO_INBOUND (1 references)\n".to_string();
        let cluster = Arc::new(cluster);
        let ctx = tool_context(cluster.clone(), Arc::new(FakeHelm::default()));
        let params = decode_params(json!({"pod_name": "sleep-1"})).unwrap();

        let body = result_json(&GetIptablesRulesTool::execute(params, &ctx).await);

        assert_eq!(body["container"], "istio-proxy");
        for table in ["filter", "nat", "mangle"] {
            assert!(body["tables"][table].as_str().unwrap().contains("ISTIO_INBOUND"));
        }

        let requests = cluster.debug_requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].container_name.starts_with("debug-iptables-"));
        assert!(requests[1].container_name.ends_with("-nat"));
        assert_eq!(requests[1].image, "istio/base");
        let polled = cluster.log_requests.lock().unwrap().clone();
        assert_eq!(polled[0].container, requests[0].container_name);
    }

    #[tokio::test]
    async fn test_silent_debug_container_times_out() {
        let mut cluster = FakeCluster::populated();
        cluster.logs = String::new();
        let ctx = tool_context(Arc::new(cluster), Arc::new(FakeHelm::default()));
        let params = decode_params(json!({"pod_name": "sleep-1", "tables": ["raw"]})).unwrap();

        let result = GetIptablesRulesTool::execute(params, &ctx).await;
        assert_ne!(result.is_error, Some(true));
        let body = result_json(&result);
        assert!(body["tables"]["raw"].as_str().unwrap().starts_with("Error: No output"));
    }

    #[tokio::test]
    async fn test_missing_pod() {
        let ctx = tool_context(Arc::new(FakeCluster::default()), Arc::new(FakeHelm::default()));
        let params = decode_params(json!({"pod_name": "ghost"})).unwrap();

        let result = GetIptablesRulesTool::execute(params, &ctx).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).starts_with("Failed to get pod"));
    }

    #[test]
    fn test_unknown_table_rejected() {
        assert!(decode_params::<GetIptablesRulesParams>(json!({"pod_name": "p", "tables": ["broute"]})).is_err());
    }
}
