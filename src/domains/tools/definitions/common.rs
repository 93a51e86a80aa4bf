//! Helpers shared by the tool definitions.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::cluster::Pod;
use crate::domains::tools::ToolError;

/// Success result carrying `value` as indented JSON.
pub fn json_result<T: Serialize>(value: &T) -> CallToolResult {
    match serde_json::to_string_pretty(value) {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => ToolError::step("Failed to encode result", e).into_result(),
    }
}

/// Success result carrying a plain message.
pub fn text_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(message.into())])
}

pub fn default_namespace() -> String {
    "default".to_string()
}

pub fn default_helm_timeout() -> String {
    "5m".to_string()
}

pub fn default_true() -> bool {
    true
}

/// Identity of a pod as reported in diagnostic results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub node: String,
}

impl From<&Pod> for PodInfo {
    fn from(pod: &Pod) -> Self {
        Self {
            name: pod.metadata.name.clone(),
            namespace: pod.namespace().to_string(),
            ip: pod.status.pod_ip.clone().unwrap_or_default(),
            node: pod.spec.node_name.clone().unwrap_or_default(),
        }
    }
}

/// The explicitly requested container, else the pod's first one.
pub fn pick_container(pod: &Pod, requested: Option<&str>) -> Result<String, ToolError> {
    match requested.filter(|c| !c.is_empty()) {
        Some(container) => Ok(container.to_string()),
        None => pod
            .first_container()
            .map(str::to_string)
            .ok_or_else(|| ToolError::execution_failed("No containers found in pod")),
    }
}
