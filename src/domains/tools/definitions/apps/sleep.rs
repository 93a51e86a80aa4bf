//! Sleep sample application tool definitions.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use tracing::instrument;

use super::{DeployAppParams, SampleApp, UndeployAppParams, deploy, undeploy};
use crate::domains::tools::definitions::common::text_result;
use crate::domains::tools::{ToolContext, ToolDefinition};

pub struct DeploySleepAppTool;

#[async_trait]
impl ToolDefinition for DeploySleepAppTool {
    const NAME: &'static str = "deploy_sleep_app";
    const DESCRIPTION: &'static str =
        "Deploy the sleep sample application (curl client) with Istio sidecar injection";

    type Params = DeployAppParams;

    #[instrument(skip_all, fields(namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        if let Err(e) = deploy(SampleApp::Sleep, &params, ctx).await {
            return e.into_result();
        }
        text_result(format!(
            "Sleep app deployment initiated in namespace '{}' with {} replicas and Istio injection enabled",
            params.namespace, params.replicas
        ))
    }
}

pub struct UndeploySleepAppTool;

#[async_trait]
impl ToolDefinition for UndeploySleepAppTool {
    const NAME: &'static str = "undeploy_sleep_app";
    const DESCRIPTION: &'static str = "Remove the sleep sample application";

    type Params = UndeployAppParams;

    #[instrument(skip_all, fields(namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        undeploy(SampleApp::Sleep, &params, ctx).await;
        text_result(format!(
            "Sleep app removal initiated from namespace '{}'",
            params.namespace
        ))
    }
}
