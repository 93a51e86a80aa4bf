//! Sleep-to-httpbin test tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::instrument;

use super::attempt::{client_container, curl_command, run_attempt};
use crate::domains::tools::definitions::apps::HTTPBIN_PORT;
use crate::domains::tools::definitions::common::{PodInfo, default_namespace, json_result};
use crate::domains::tools::params::{ensure_range, require_items};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

fn default_endpoints() -> Vec<String> {
    ["/get", "/headers", "/status/200", "/delay/1"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_timeout() -> u32 {
    10
}

/// Parameters for the sleep-to-httpbin test tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TestSleepToHttpbinParams {
    /// Namespace of the sleep pods.
    #[serde(default = "default_namespace")]
    pub source_namespace: String,

    /// Namespace of the httpbin service.
    #[serde(default = "default_namespace")]
    pub target_namespace: String,

    /// httpbin paths to request, one request each.
    #[serde(default = "default_endpoints")]
    pub test_endpoints: Vec<String>,

    /// Connect timeout per request, in seconds.
    #[serde(default = "default_timeout")]
    #[schemars(range(min = 1, max = 300))]
    pub timeout: u32,
}

impl ToolParams for TestSleepToHttpbinParams {
    fn validate(&self) -> Result<(), ToolError> {
        require_items("test_endpoints", &self.test_endpoints)?;
        ensure_range("timeout", self.timeout, 1, 300)
    }
}

/// Runs a fixed set of HTTP requests from the sleep app to httpbin.
pub struct TestSleepToHttpbinTool;

#[async_trait]
impl ToolDefinition for TestSleepToHttpbinTool {
    const NAME: &'static str = "test_sleep_to_httpbin";
    const DESCRIPTION: &'static str =
        "Test connectivity from the sleep sample app to the httpbin sample app across several endpoints";

    type Params = TestSleepToHttpbinParams;

    #[instrument(skip_all)]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let pods = match ctx.cluster.list_pods(&params.source_namespace, "app=sleep").await {
            Ok(pods) => pods,
            Err(e) => return ToolError::step("Failed to list sleep pods", e).into_result(),
        };
        let Some(sleep) = pods.first() else {
            return ToolError::execution_failed("No sleep pods found").into_result();
        };

        let service = match ctx.cluster.get_service(&params.target_namespace, "httpbin").await {
            Ok(service) => service,
            Err(e) => return ToolError::step("Failed to get httpbin service", e).into_result(),
        };

        let source = PodInfo::from(sleep);
        let container = client_container(sleep);
        let destination = PodInfo {
            name: "httpbin".to_string(),
            namespace: params.target_namespace.clone(),
            ip: service.spec.cluster_ip.clone().unwrap_or_default(),
            node: String::new(),
        };
        let host = format!("httpbin.{}.svc.cluster.local", params.target_namespace);
        let exec_timeout = Duration::from_secs(u64::from(params.timeout) + 5);

        let mut results = Vec::with_capacity(params.test_endpoints.len());
        for endpoint in &params.test_endpoints {
            let url = format!("http://{}:{}{}", host, HTTPBIN_PORT, endpoint);
            let command = curl_command(&url, None, params.timeout);
            results.push(
                run_attempt(ctx, &source, &container, destination.clone(), command, true, exec_timeout)
                    .await,
            );
        }

        let successful = results.iter().filter(|r| r.success).count();
        json_result(&json!({
            "summary": format!(
                "Sleep to Httpbin connectivity test completed: {}/{} tests successful",
                successful,
                results.len()
            ),
            "results": results,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::params::decode_params;
    use crate::testing::{FakeCluster, FakeHelm, result_json, result_text, tool_context};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_each_endpoint_requested() {
        let cluster = Arc::new(FakeCluster::populated());
        cluster.script_exec(Ok("HTTP_CODE:200\n".to_string()));
        cluster.script_exec(Ok("HTTP_CODE:404\n".to_string()));
        let ctx = tool_context(cluster.clone(), Arc::new(FakeHelm::default()));
        let params: TestSleepToHttpbinParams =
            decode_params(json!({"test_endpoints": ["/get", "/missing"]})).unwrap();

        let body = result_json(&TestSleepToHttpbinTool::execute(params, &ctx).await);
        assert_eq!(
            body["summary"],
            "Sleep to Httpbin connectivity test completed: 1/2 tests successful"
        );
        assert_eq!(body["results"][0]["destination"]["ip"], "10.96.0.20");

        let executed = cluster.executed.lock().unwrap().clone();
        assert_eq!(
            executed[1].1.last().unwrap(),
            "http://httpbin.default.svc.cluster.local:8000/missing"
        );
        assert!(!executed[0].1.contains(&"-X".to_string()));
    }

    #[tokio::test]
    async fn test_no_sleep_pods() {
        let ctx = tool_context(Arc::new(FakeCluster::default()), Arc::new(FakeHelm::default()));
        let params: TestSleepToHttpbinParams = decode_params(json!({})).unwrap();
        let result = TestSleepToHttpbinTool::execute(params, &ctx).await;
        assert_eq!(result_text(&result), "No sleep pods found");
    }
}
