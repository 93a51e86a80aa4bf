//! Tool Dispatcher - routes a tool call to its handler.
//!
//! Every call goes through the same sequence: client availability, tool
//! lookup, argument decoding, then exactly one handler. The first failing
//! check produces the result; later steps never run.

use rmcp::model::CallToolResult;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::context::{ToolContext, ToolDefinition};
use super::definitions::*;
use super::error::ToolError;
use super::params::{decode_params, parse_arguments};
use super::registry::ToolName;

/// Entry point for executing tools, shared by every transport and the CLI.
#[derive(Clone)]
pub struct ToolDispatcher {
    context: Option<Arc<ToolContext>>,
}

impl ToolDispatcher {
    pub fn new(context: ToolContext) -> Self {
        Self {
            context: Some(Arc::new(context)),
        }
    }

    /// A dispatcher without a cluster; every call reports the client as unavailable.
    pub fn unavailable() -> Self {
        Self { context: None }
    }

    pub fn is_available(&self) -> bool {
        self.context.is_some()
    }

    fn resolve(&self, name: &str) -> Result<(&ToolContext, ToolName), ToolError> {
        let context = self.context.as_deref().ok_or(ToolError::ClientUnavailable)?;
        let tool = name.parse::<ToolName>()?;
        Ok((context, tool))
    }

    /// Execute a tool with an already-parsed argument payload.
    #[instrument(skip(self, arguments))]
    pub async fn execute(&self, name: &str, arguments: Value) -> CallToolResult {
        match self.resolve(name) {
            Ok((context, tool)) => dispatch(tool, arguments, context).await,
            Err(e) => e.into_result(),
        }
    }

    /// Execute a tool with a raw JSON argument string (blank means none).
    #[instrument(skip(self, raw_arguments))]
    pub async fn execute_json(&self, name: &str, raw_arguments: &str) -> CallToolResult {
        let (context, tool) = match self.resolve(name) {
            Ok(resolved) => resolved,
            Err(e) => return e.into_result(),
        };
        match parse_arguments(raw_arguments) {
            Ok(arguments) => dispatch(tool, arguments, context).await,
            Err(e) => e.into_result(),
        }
    }
}

async fn dispatch(tool: ToolName, arguments: Value, ctx: &ToolContext) -> CallToolResult {
    debug!("Dispatching {}", tool);
    match tool {
        ToolName::ListContexts => invoke::<ListContextsTool>(arguments, ctx).await,
        ToolName::SwitchContext => invoke::<SwitchContextTool>(arguments, ctx).await,
        ToolName::GetClusterInfo => invoke::<GetClusterInfoTool>(arguments, ctx).await,
        ToolName::InstallIstio => invoke::<InstallIstioTool>(arguments, ctx).await,
        ToolName::UninstallIstio => invoke::<UninstallIstioTool>(arguments, ctx).await,
        ToolName::CheckIstioStatus => invoke::<CheckIstioStatusTool>(arguments, ctx).await,
        ToolName::InstallSailOperator => invoke::<InstallSailOperatorTool>(arguments, ctx).await,
        ToolName::UninstallSailOperator => {
            invoke::<UninstallSailOperatorTool>(arguments, ctx).await
        }
        ToolName::CheckSailStatus => invoke::<CheckSailStatusTool>(arguments, ctx).await,
        ToolName::DeploySleepApp => invoke::<DeploySleepAppTool>(arguments, ctx).await,
        ToolName::DeployHttpbinApp => invoke::<DeployHttpbinAppTool>(arguments, ctx).await,
        ToolName::UndeploySleepApp => invoke::<UndeploySleepAppTool>(arguments, ctx).await,
        ToolName::UndeployHttpbinApp => invoke::<UndeployHttpbinAppTool>(arguments, ctx).await,
        ToolName::TestConnectivity => invoke::<TestConnectivityTool>(arguments, ctx).await,
        ToolName::TestSleepToHttpbin => invoke::<TestSleepToHttpbinTool>(arguments, ctx).await,
        ToolName::GetPodLogs => invoke::<GetPodLogsTool>(arguments, ctx).await,
        ToolName::GetIstioProxyLogs => invoke::<GetIstioProxyLogsTool>(arguments, ctx).await,
        ToolName::ExecPodCommand => invoke::<ExecPodCommandTool>(arguments, ctx).await,
        ToolName::GetIptablesRules => invoke::<GetIptablesRulesTool>(arguments, ctx).await,
        ToolName::GetNetworkPolicies => invoke::<GetNetworkPoliciesTool>(arguments, ctx).await,
        ToolName::TraceNetworkPath => invoke::<TraceNetworkPathTool>(arguments, ctx).await,
    }
}

async fn invoke<T: ToolDefinition>(arguments: Value, ctx: &ToolContext) -> CallToolResult {
    match decode_params::<T::Params>(arguments) {
        Ok(params) => T::execute(params, ctx).await,
        Err(e) => e.into_result(),
    }
}

/// Decode `arguments` with the tool's parameter struct and re-encode the
/// result, defaults applied.
#[cfg(test)]
pub(crate) fn decode_for(tool: ToolName, arguments: Value) -> Result<Value, ToolError> {
    fn roundtrip<T: ToolDefinition>(arguments: Value) -> Result<Value, ToolError> {
        let params = decode_params::<T::Params>(arguments)?;
        serde_json::to_value(&params).map_err(|e| ToolError::invalid_arguments(e.to_string()))
    }

    match tool {
        ToolName::ListContexts => roundtrip::<ListContextsTool>(arguments),
        ToolName::SwitchContext => roundtrip::<SwitchContextTool>(arguments),
        ToolName::GetClusterInfo => roundtrip::<GetClusterInfoTool>(arguments),
        ToolName::InstallIstio => roundtrip::<InstallIstioTool>(arguments),
        ToolName::UninstallIstio => roundtrip::<UninstallIstioTool>(arguments),
        ToolName::CheckIstioStatus => roundtrip::<CheckIstioStatusTool>(arguments),
        ToolName::InstallSailOperator => roundtrip::<InstallSailOperatorTool>(arguments),
        ToolName::UninstallSailOperator => roundtrip::<UninstallSailOperatorTool>(arguments),
        ToolName::CheckSailStatus => roundtrip::<CheckSailStatusTool>(arguments),
        ToolName::DeploySleepApp => roundtrip::<DeploySleepAppTool>(arguments),
        ToolName::DeployHttpbinApp => roundtrip::<DeployHttpbinAppTool>(arguments),
        ToolName::UndeploySleepApp => roundtrip::<UndeploySleepAppTool>(arguments),
        ToolName::UndeployHttpbinApp => roundtrip::<UndeployHttpbinAppTool>(arguments),
        ToolName::TestConnectivity => roundtrip::<TestConnectivityTool>(arguments),
        ToolName::TestSleepToHttpbin => roundtrip::<TestSleepToHttpbinTool>(arguments),
        ToolName::GetPodLogs => roundtrip::<GetPodLogsTool>(arguments),
        ToolName::GetIstioProxyLogs => roundtrip::<GetIstioProxyLogsTool>(arguments),
        ToolName::ExecPodCommand => roundtrip::<ExecPodCommandTool>(arguments),
        ToolName::GetIptablesRules => roundtrip::<GetIptablesRulesTool>(arguments),
        ToolName::GetNetworkPolicies => roundtrip::<GetNetworkPoliciesTool>(arguments),
        ToolName::TraceNetworkPath => roundtrip::<TraceNetworkPathTool>(arguments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCluster, FakeHelm, minimal_arguments, result_text, tool_context};
    use serde_json::json;

    fn dispatcher(cluster: &Arc<FakeCluster>, helm: &Arc<FakeHelm>) -> ToolDispatcher {
        ToolDispatcher::new(tool_context(cluster.clone(), helm.clone()))
    }

    #[tokio::test]
    async fn test_unavailable_client_reported_first() {
        let dispatcher = ToolDispatcher::unavailable();
        assert!(!dispatcher.is_available());

        for name in ["list_contexts", "no_such_tool"] {
            let result = dispatcher.execute(name, json!({})).await;
            assert_eq!(result.is_error, Some(true));
            assert!(result_text(&result).starts_with("Kubernetes client not available"));
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_touches_nothing() {
        let cluster = Arc::new(FakeCluster::default());
        let helm = Arc::new(FakeHelm::default());
        let result = dispatcher(&cluster, &helm)
            .execute("install_linkerd", json!({}))
            .await;

        assert_eq!(result.is_error, Some(true));
        assert_eq!(result_text(&result), "Unknown tool: install_linkerd");
        assert_eq!(cluster.call_count(), 0);
        assert_eq!(helm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_arguments_touch_nothing() {
        let cluster = Arc::new(FakeCluster::default());
        let helm = Arc::new(FakeHelm::default());
        let dispatcher = dispatcher(&cluster, &helm);

        let result = dispatcher.execute_json("get_pod_logs", "{not json").await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).starts_with("Invalid parameters:"));

        let result = dispatcher.execute("install_istio", json!({"install_cni": "yes"})).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).starts_with("Invalid parameters:"));

        let result = dispatcher.execute("get_pod_logs", json!(["pod"])).await;
        assert_eq!(result.is_error, Some(true));

        assert_eq!(cluster.call_count(), 0);
        assert_eq!(helm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_duration_is_an_error_result() {
        let cluster = Arc::new(FakeCluster::populated());
        let helm = Arc::new(FakeHelm::default());
        let dispatcher = dispatcher(&cluster, &helm);

        let result = dispatcher
            .execute("install_istio", json!({"timeout": "99999999999999999999999h"}))
            .await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).contains("out of range"));

        let result = dispatcher
            .execute("get_pod_logs", json!({"pod_name": "sleep-1", "since": "99999999999999999999999h"}))
            .await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(helm.call_count(), 0);
        assert_eq!(cluster.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_required_field_named() {
        let cluster = Arc::new(FakeCluster::default());
        let helm = Arc::new(FakeHelm::default());
        let result = dispatcher(&cluster, &helm)
            .execute("test_connectivity", json!({"source_pod": "sleep-1", "target_service": "httpbin"}))
            .await;

        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).contains("target_port"));
        assert_eq!(cluster.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_argument_string_means_defaults() {
        let cluster = Arc::new(FakeCluster::default());
        let helm = Arc::new(FakeHelm::default());
        let result = dispatcher(&cluster, &helm).execute_json("list_contexts", "  ").await;
        assert_eq!(result.is_error, Some(false));
    }

    /// Every tool accepts its minimal arguments against a healthy fake cluster.
    #[tokio::test]
    async fn test_every_tool_runs_against_fakes() {
        for tool in ToolName::ALL {
            let cluster = Arc::new(FakeCluster::populated());
            let helm = Arc::new(FakeHelm::with_istio_releases());
            let result = dispatcher(&cluster, &helm)
                .execute(tool.as_str(), minimal_arguments(tool))
                .await;
            assert_eq!(
                result.is_error,
                Some(false),
                "{} failed: {}",
                tool,
                result_text(&result)
            );
            assert!(!result.content.is_empty());
        }
    }
}
