//! Network policy listing tool definition.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::cluster::NetworkPolicySpec;
use crate::domains::tools::definitions::common::{default_namespace, json_result};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolParams};

/// Parameters for the network policy tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetNetworkPoliciesParams {
    /// Namespace to list policies in.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Keep only policies whose pod selector matches this pod.
    #[serde(default)]
    pub pod_name: Option<String>,

    /// Label selector applied to the policies themselves (e.g. `team=payments`).
    #[serde(default)]
    pub label_selector: Option<String>,
}

impl ToolParams for GetNetworkPoliciesParams {}

#[derive(Debug, Serialize)]
struct PolicyInfo {
    name: String,
    namespace: String,
    spec: NetworkPolicySpec,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct PolicyList {
    namespace: String,
    count: usize,
    policies: Vec<PolicyInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filtered_for_pod: Option<String>,
}

/// Lists network policies, optionally narrowed to those selecting a pod.
pub struct GetNetworkPoliciesTool;

#[async_trait]
impl ToolDefinition for GetNetworkPoliciesTool {
    const NAME: &'static str = "get_network_policies";
    const DESCRIPTION: &'static str = "List Kubernetes network policies in a namespace, optionally only those applying to a pod";

    type Params = GetNetworkPoliciesParams;

    #[instrument(skip_all, fields(namespace = %params.namespace))]
    async fn execute(params: Self::Params, ctx: &ToolContext) -> CallToolResult {
        let selector = params.label_selector.as_deref().filter(|s| !s.is_empty());
        let policies = match ctx.cluster.list_network_policies(&params.namespace, selector).await {
            Ok(policies) => policies,
            Err(e) => return ToolError::step("Failed to list network policies", e).into_result(),
        };

        let pod_name = params.pod_name.filter(|p| !p.is_empty());
        // A pod that cannot be read does not narrow the listing.
        let pod_labels = match &pod_name {
            Some(name) => match ctx.cluster.get_pod(&params.namespace, name).await {
                Ok(pod) => Some(pod.metadata.labels),
                Err(e) => {
                    warn!("Failed to get pod {} for label filtering: {}", name, e);
                    None
                }
            },
            None => None,
        };

        let policies: Vec<PolicyInfo> = policies
            .into_iter()
            .filter(|policy| {
                pod_labels
                    .as_ref()
                    .is_none_or(|labels| policy.spec.pod_selector.matches(labels))
            })
            .map(|policy| PolicyInfo {
                namespace: policy
                    .metadata
                    .namespace
                    .clone()
                    .unwrap_or_else(|| params.namespace.clone()),
                name: policy.metadata.name,
                spec: policy.spec,
                status: "active",
            })
            .collect();

        json_result(&PolicyList {
            namespace: params.namespace,
            count: policies.len(),
            policies,
            filtered_for_pod: pod_name,
        })
    }
}
