//! Httpbin sample application tool definitions.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use tracing::instrument;

use super::{DeployAppParams, SampleApp, UndeployAppParams, deploy, undeploy};
use crate::domains::tools::definitions::common::text_result;
use crate::domains::tools::{ToolContext, ToolDefinition};

pub struct DeployHttpbinAppTool;

#[async_trait]
impl ToolDefinition for DeployHttpbinAppTool {
    const NAME: &'static str = "deploy_httpbin_app";
    const DESCRIPTION: &'static str =
        "Deploy the httpbin sample application (HTTP echo server) with Istio sidecar injection and a service on port 8000";

    type Params = DeployAppParams;

    #[instrument(skip_all, fields(namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        if let Err(e) = deploy(SampleApp::Httpbin, &params, ctx).await {
            return e.into_result();
        }
        text_result(format!(
            "Httpbin app deployment initiated in namespace '{}' with {} replicas, Istio injection enabled, and service exposed",
            params.namespace, params.replicas
        ))
    }
}

pub struct UndeployHttpbinAppTool;

#[async_trait]
impl ToolDefinition for UndeployHttpbinAppTool {
    const NAME: &'static str = "undeploy_httpbin_app";
    const DESCRIPTION: &'static str = "Remove the httpbin sample application";

    type Params = UndeployAppParams;

    #[instrument(skip_all, fields(namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        undeploy(SampleApp::Httpbin, &params, ctx).await;
        text_result(format!(
            "Httpbin app removal initiated from namespace '{}'",
            params.namespace
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ResourceKind;
    use crate::domains::tools::params::decode_params;
    use crate::testing::{FakeCluster, FakeHelm, result_text, tool_context};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_deploy_exposes_service() {
        let cluster = Arc::new(FakeCluster::default());
        let ctx = tool_context(cluster.clone(), Arc::new(FakeHelm::default()));
        let params: DeployAppParams = decode_params(json!({"replicas": 2})).unwrap();

        let result = DeployHttpbinAppTool::execute(params, &ctx).await;
        assert!(result_text(&result).contains("with 2 replicas, Istio injection enabled, and service exposed"));
        let applied = cluster.applied.lock().unwrap().clone();
        assert_eq!(applied.len(), 4);
        assert_eq!(applied[3]["kind"], "Service");
    }

    #[tokio::test]
    async fn test_undeploy_removes_everything() {
        let cluster = Arc::new(FakeCluster::default());
        let ctx = tool_context(cluster.clone(), Arc::new(FakeHelm::default()));
        let params: UndeployAppParams = decode_params(json!({})).unwrap();

        let result = UndeployHttpbinAppTool::execute(params, &ctx).await;
        assert_eq!(result_text(&result), "Httpbin app removal initiated from namespace 'default'");

        let kinds: Vec<ResourceKind> = cluster.deleted.lock().unwrap().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![ResourceKind::Deployment, ResourceKind::Service, ResourceKind::ServiceAccount]
        );
    }
}
