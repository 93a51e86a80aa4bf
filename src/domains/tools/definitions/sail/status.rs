//! Sail operator status tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::default_sail_namespace;
use crate::cluster::{ClusterResult, Deployment};
use crate::domains::tools::definitions::common::json_result;
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

/// Label selectors tried in order; older installs used the later ones.
const OPERATOR_SELECTORS: [&str; 3] = [
    "app.kubernetes.io/component=sail-operator",
    "app.kubernetes.io/name=sail-operator",
    "app=sail-operator",
];

/// Parameters for the Sail operator status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckSailStatusParams {
    /// Namespace of the operator.
    #[serde(default = "default_sail_namespace")]
    pub namespace: String,
}

impl ToolParams for CheckSailStatusParams {}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SailStatus {
    pub installed: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub namespace: String,
    pub ready: bool,
    pub replicas: i32,
    pub available: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

async fn find_operator(ctx: &ToolContext, namespace: &str) -> ClusterResult<Option<Deployment>> {
    for selector in OPERATOR_SELECTORS {
        let mut deployments = ctx.cluster.list_deployments(namespace, selector).await?;
        if !deployments.is_empty() {
            return Ok(Some(deployments.swap_remove(0)));
        }
    }
    Ok(None)
}

pub(crate) async fn sail_status(ctx: &ToolContext, namespace: &str) -> ClusterResult<SailStatus> {
    let Some(operator) = find_operator(ctx, namespace).await? else {
        return Ok(SailStatus {
            installed: false,
            version: String::new(),
            namespace: namespace.to_string(),
            ready: false,
            replicas: 0,
            available: 0,
            issues: vec!["Sail operator deployment not found".to_string()],
        });
    };

    let ready = operator.is_ready();
    let mut issues = Vec::new();
    if !ready {
        issues.push("Sail operator is not ready".to_string());
    }

    let mut version = operator.image_tag().unwrap_or("unknown").to_string();
    match ctx.helm.list_releases(namespace, "sail-operator").await {
        Ok(releases) => {
            if let Some(release) = releases.first() {
                version = release.version().unwrap_or("unknown").to_string();
            }
        }
        Err(e) => debug!("Could not read sail-operator release: {}", e),
    }

    Ok(SailStatus {
        installed: true,
        version,
        namespace: namespace.to_string(),
        ready,
        replicas: operator.status.replicas,
        available: operator.status.available_replicas,
        issues,
    })
}

pub struct CheckSailStatusTool;

#[async_trait]
impl ToolDefinition for CheckSailStatusTool {
    const NAME: &'static str = "check_sail_status";
    const DESCRIPTION: &'static str = "Check the status of the Sail operator installation";

    type Params = CheckSailStatusParams;

    #[instrument(skip_all, fields(namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        match sail_status(ctx, &params.namespace).await {
            Ok(status) => json_result(&status),
            Err(e) => ToolError::step("Failed to get Sail operator status", e).into_result(),
        }
    }
}
