//! Pod exec tool definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

use crate::domains::tools::definitions::common::{default_namespace, json_result, pick_container};
use crate::domains::tools::params::{ensure_range, require_items, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

/// Parameters for the exec tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecPodCommandParams {
    /// Pod to run the command in.
    pub pod_name: String,

    /// Namespace of the pod.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Container to run in (the pod's first container when omitted).
    #[serde(default)]
    pub container: Option<String>,

    /// Program and arguments, e.g. `["ls", "-la", "/etc"]`.
    pub command: Vec<String>,

    /// Upper bound for the command, in seconds.
    #[serde(default)]
    #[schemars(range(min = 1, max = 3600))]
    pub timeout: Option<u64>,
}

impl ToolParams for ExecPodCommandParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_non_empty("pod_name", &self.pod_name)?;
        require_items("command", &self.command)?;
        if let Some(timeout) = self.timeout {
            ensure_range("timeout", timeout, 1, 3600)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ExecResult {
    pod: String,
    namespace: String,
    container: String,
    command: String,
    timestamp: DateTime<Utc>,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Runs an arbitrary command in a pod container.
pub struct ExecPodCommandTool;

#[async_trait]
impl ToolDefinition for ExecPodCommandTool {
    const NAME: &'static str = "exec_pod_command";
    const DESCRIPTION: &'static str = "Execute a command in a pod container and return its output";

    type Params = ExecPodCommandParams;

    #[instrument(skip_all, fields(pod = %params.pod_name, namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let container = match params.container.as_deref().filter(|c| !c.is_empty()) {
            Some(container) => container.to_string(),
            None => {
                let pod = match ctx.cluster.get_pod(&params.namespace, &params.pod_name).await {
                    Ok(pod) => pod,
                    Err(e) => return ToolError::step("Failed to get pod", e).into_result(),
                };
                match pick_container(&pod, None) {
                    Ok(container) => container,
                    Err(e) => return e.into_result(),
                }
            }
        };

        info!("Executing '{}' in {}/{}", params.command.join(" "), params.pod_name, container);
        let timestamp = Utc::now();
        let outcome = ctx
            .cluster
            .exec(
                &params.namespace,
                &params.pod_name,
                &container,
                &params.command,
                params.timeout.map(Duration::from_secs),
            )
            .await;

        let (success, output, error) = match outcome {
            Ok(stdout) => (true, Some(stdout), None),
            Err(e) => (false, None, Some(e.to_string())),
        };

        json_result(&ExecResult {
            pod: params.pod_name,
            namespace: params.namespace,
            container,
            command: params.command.join(" "),
            timestamp,
            success,
            output,
            error,
        })
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

    #[tokio::test]
    async fn test_defaults_to_first_container() {
        let cluster = Arc::new(FakeCluster::populated());
        let ctx = tool_context(cluster.clone(), Arc::new(FakeHelm::default()));
        let params = decode_params(json!({"pod_name": "sleep-1", "command": ["ls", "-la"]})).unwrap();

        let body = result_json(&ExecPodCommandTool::execute(params, &ctx).await);

        assert_eq!(body["success"], true);
        assert_eq!(body["container"], "sleep");
        assert_eq!(body["command"], "ls -la");
        let executed = cluster.executed.lock().unwrap().clone();
        assert_eq!(executed, vec![("sleep".to_string(), vec!["ls".to_string(), "-la".to_string()])]);
    }

    #[tokio::test]
    async fn test_explicit_container_skips_pod_lookup() {
        let cluster = Arc::new(FakeCluster::default());
        let ctx = tool_context(cluster.clone(), Arc::new(FakeHelm::default()));
        let params = decode_params(json!({
            "pod_name": "sleep-1",
            "container": "istio-proxy",
            "command": ["pilot-agent", "request", "GET", "stats"]
        }))
        .unwrap();

        let body = result_json(&ExecPodCommandTool::execute(params, &ctx).await);

        assert_eq!(body["container"], "istio-proxy");
        assert_eq!(cluster.call_count(), 1);
    }

    #[tokio::test]
    async fn test_command_failure_is_reported_not_raised() {
        let cluster = Arc::new(FakeCluster::populated());
        cluster.script_exec(Err(ClusterError::CommandFailed {
            program: "kubectl".to_string(),
            message: "command terminated with exit code 2".to_string(),
        }));
        let ctx = tool_context(cluster, Arc::new(FakeHelm::default()));
        let params = decode_params(json!({"pod_name": "sleep-1", "command": ["false"]})).unwrap();

        let result = ExecPodCommandTool::execute(params, &ctx).await;
        assert_ne!(result.is_error, Some(true));
        let body = result_json(&result);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("exit code 2"));
        assert!(body.get("output").is_none());
    }

    #[tokio::test]
    async fn test_missing_pod() {
        let ctx = tool_context(Arc::new(FakeCluster::default()), Arc::new(FakeHelm::default()));
        let params = decode_params(json!({"pod_name": "ghost", "command": ["ls"]})).unwrap();

        let result = ExecPodCommandTool::execute(params, &ctx).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).starts_with("Failed to get pod"));
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = decode_params::<ExecPodCommandParams>(json!({"pod_name": "p", "command": []}))
            .unwrap_err();
        assert!(err.to_string().contains("command"));
    }
}
