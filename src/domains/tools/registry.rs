//! Tool Registry - the closed catalog of tools and their argument contracts.
//!
//! [`ToolName`] enumerates every tool; the dispatcher matches on it
//! exhaustively. [`ToolDescriptor`]s are derived from each tool's parameter
//! struct once, on first use, and are immutable afterwards.

use rmcp::model::{JsonObject, Tool};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use super::context::{ToolDefinition, tool_schema};
use super::definitions::*;
use super::error::ToolError;

// ============================================================================
// Tool names
// ============================================================================

/// Every tool the server exposes.
///
/// Discriminants index `ALL` and the descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum ToolName {
    ListContexts,
    SwitchContext,
    GetClusterInfo,
    InstallIstio,
    UninstallIstio,
    CheckIstioStatus,
    InstallSailOperator,
    UninstallSailOperator,
    CheckSailStatus,
    DeploySleepApp,
    DeployHttpbinApp,
    UndeploySleepApp,
    UndeployHttpbinApp,
    TestConnectivity,
    TestSleepToHttpbin,
    GetPodLogs,
    GetIstioProxyLogs,
    ExecPodCommand,
    GetIptablesRules,
    GetNetworkPolicies,
    TraceNetworkPath,
}

impl ToolName {
    /// All tools, in listing order.
    pub const ALL: [ToolName; 21] = [
        Self::ListContexts,
        Self::SwitchContext,
        Self::GetClusterInfo,
        Self::InstallIstio,
        Self::UninstallIstio,
        Self::CheckIstioStatus,
        Self::InstallSailOperator,
        Self::UninstallSailOperator,
        Self::CheckSailStatus,
        Self::DeploySleepApp,
        Self::DeployHttpbinApp,
        Self::UndeploySleepApp,
        Self::UndeployHttpbinApp,
        Self::TestConnectivity,
        Self::TestSleepToHttpbin,
        Self::GetPodLogs,
        Self::GetIstioProxyLogs,
        Self::ExecPodCommand,
        Self::GetIptablesRules,
        Self::GetNetworkPolicies,
        Self::TraceNetworkPath,
    ];

    /// Wire name of the tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListContexts => ListContextsTool::NAME,
            Self::SwitchContext => SwitchContextTool::NAME,
            Self::GetClusterInfo => GetClusterInfoTool::NAME,
            Self::InstallIstio => InstallIstioTool::NAME,
            Self::UninstallIstio => UninstallIstioTool::NAME,
            Self::CheckIstioStatus => CheckIstioStatusTool::NAME,
            Self::InstallSailOperator => InstallSailOperatorTool::NAME,
            Self::UninstallSailOperator => UninstallSailOperatorTool::NAME,
            Self::CheckSailStatus => CheckSailStatusTool::NAME,
            Self::DeploySleepApp => DeploySleepAppTool::NAME,
            Self::DeployHttpbinApp => DeployHttpbinAppTool::NAME,
            Self::UndeploySleepApp => UndeploySleepAppTool::NAME,
            Self::UndeployHttpbinApp => UndeployHttpbinAppTool::NAME,
            Self::TestConnectivity => TestConnectivityTool::NAME,
            Self::TestSleepToHttpbin => TestSleepToHttpbinTool::NAME,
            Self::GetPodLogs => GetPodLogsTool::NAME,
            Self::GetIstioProxyLogs => GetIstioProxyLogsTool::NAME,
            Self::ExecPodCommand => ExecPodCommandTool::NAME,
            Self::GetIptablesRules => GetIptablesRulesTool::NAME,
            Self::GetNetworkPolicies => GetNetworkPoliciesTool::NAME,
            Self::TraceNetworkPath => TraceNetworkPathTool::NAME,
        }
    }

    pub fn category(&self) -> ToolCategory {
        match self {
            Self::ListContexts | Self::SwitchContext | Self::GetClusterInfo => ToolCategory::Cluster,
            Self::InstallIstio | Self::UninstallIstio | Self::CheckIstioStatus => ToolCategory::Istio,
            Self::InstallSailOperator | Self::UninstallSailOperator | Self::CheckSailStatus => {
                ToolCategory::Sail
            }
            Self::DeploySleepApp
            | Self::DeployHttpbinApp
            | Self::UndeploySleepApp
            | Self::UndeployHttpbinApp => ToolCategory::SampleApps,
            Self::TestConnectivity | Self::TestSleepToHttpbin => ToolCategory::Connectivity,
            Self::GetPodLogs | Self::GetIstioProxyLogs | Self::ExecPodCommand => ToolCategory::Logging,
            Self::GetIptablesRules | Self::GetNetworkPolicies | Self::TraceNetworkPath => {
                ToolCategory::Network
            }
        }
    }

    /// The tool's descriptor.
    pub fn descriptor(&self) -> &'static ToolDescriptor {
        &DESCRIPTORS[*self as usize]
    }

    fn build_descriptor(self) -> ToolDescriptor {
        match self {
            Self::ListContexts => ToolDescriptor::of::<ListContextsTool>(self),
            Self::SwitchContext => ToolDescriptor::of::<SwitchContextTool>(self),
            Self::GetClusterInfo => ToolDescriptor::of::<GetClusterInfoTool>(self),
            Self::InstallIstio => ToolDescriptor::of::<InstallIstioTool>(self),
            Self::UninstallIstio => ToolDescriptor::of::<UninstallIstioTool>(self),
            Self::CheckIstioStatus => ToolDescriptor::of::<CheckIstioStatusTool>(self),
            Self::InstallSailOperator => ToolDescriptor::of::<InstallSailOperatorTool>(self),
            Self::UninstallSailOperator => ToolDescriptor::of::<UninstallSailOperatorTool>(self),
            Self::CheckSailStatus => ToolDescriptor::of::<CheckSailStatusTool>(self),
            Self::DeploySleepApp => ToolDescriptor::of::<DeploySleepAppTool>(self),
            Self::DeployHttpbinApp => ToolDescriptor::of::<DeployHttpbinAppTool>(self),
            Self::UndeploySleepApp => ToolDescriptor::of::<UndeploySleepAppTool>(self),
            Self::UndeployHttpbinApp => ToolDescriptor::of::<UndeployHttpbinAppTool>(self),
            Self::TestConnectivity => ToolDescriptor::of::<TestConnectivityTool>(self),
            Self::TestSleepToHttpbin => ToolDescriptor::of::<TestSleepToHttpbinTool>(self),
            Self::GetPodLogs => ToolDescriptor::of::<GetPodLogsTool>(self),
            Self::GetIstioProxyLogs => ToolDescriptor::of::<GetIstioProxyLogsTool>(self),
            Self::ExecPodCommand => ToolDescriptor::of::<ExecPodCommandTool>(self),
            Self::GetIptablesRules => ToolDescriptor::of::<GetIptablesRulesTool>(self),
            Self::GetNetworkPolicies => ToolDescriptor::of::<GetNetworkPoliciesTool>(self),
            Self::TraceNetworkPath => ToolDescriptor::of::<TraceNetworkPathTool>(self),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ToolError::not_found(s))
    }
}

/// Grouping used in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolCategory {
    Cluster,
    Istio,
    Sail,
    SampleApps,
    Connectivity,
    Logging,
    Network,
}

impl ToolCategory {
    pub const ALL: [ToolCategory; 7] = [
        Self::Cluster,
        Self::Istio,
        Self::Sail,
        Self::SampleApps,
        Self::Connectivity,
        Self::Logging,
        Self::Network,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Cluster => "Cluster Management",
            Self::Istio => "Istio Management",
            Self::Sail => "Sail Operator",
            Self::SampleApps => "Sample Applications",
            Self::Connectivity => "Connectivity Testing",
            Self::Logging => "Logging & Debugging",
            Self::Network => "Network Debugging",
        }
    }

    pub fn tools(&self) -> impl Iterator<Item = ToolName> + '_ {
        ToolName::ALL.into_iter().filter(move |t| t.category() == *self)
    }
}

// ============================================================================
// Descriptors
// ============================================================================

static DESCRIPTORS: LazyLock<Vec<ToolDescriptor>> =
    LazyLock::new(|| ToolName::ALL.into_iter().map(ToolName::build_descriptor).collect());

/// Look up a tool's descriptor by wire name.
pub fn describe(name: &str) -> Option<&'static ToolDescriptor> {
    name.parse::<ToolName>().ok().map(|t| t.descriptor())
}

/// All descriptors, in listing order.
pub fn descriptors() -> &'static [ToolDescriptor] {
    &DESCRIPTORS
}

/// MCP tool models for `tools/list`.
pub fn all_tools() -> Vec<Tool> {
    DESCRIPTORS.iter().map(ToolDescriptor::to_tool).collect()
}

/// Identity and argument contract of one tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: ToolName,
    pub description: &'static str,
    pub input_schema: Arc<JsonObject>,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDescriptor {
    fn of<T: ToolDefinition>(name: ToolName) -> Self {
        let input_schema = tool_schema::<T>();
        let parameters = extract_parameters(&input_schema);
        Self {
            name,
            description: T::DESCRIPTION,
            input_schema,
            parameters,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Names of the mandatory parameters.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.as_str().into(),
            description: Some(self.description.into()),
            input_schema: self.input_schema.clone(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// Type tag of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Boolean,
    Integer,
    Number,
    StringArray,
    Array,
    Object,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::StringArray => "array of strings",
            Self::Array => "array",
            Self::Object => "object",
        })
    }
}

/// One parameter of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    /// Enumerated allowed values; empty when unconstrained.
    pub allowed: Vec<String>,
    pub required: bool,
}

// ============================================================================
// Schema walking
// ============================================================================

fn extract_parameters(schema: &JsonObject) -> Vec<ParameterSpec> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, node)| ParameterSpec {
            name: name.clone(),
            kind: kind_of(schema, node),
            description: find(schema, node, "description")
                .and_then(Value::as_str)
                .map(str::to_string),
            default: find(schema, node, "default").cloned(),
            minimum: find(schema, node, "minimum").and_then(as_i64),
            maximum: find(schema, node, "maximum").and_then(as_i64),
            allowed: allowed_values(schema, node),
            required: required.contains(&name.as_str()),
        })
        .collect()
}

fn as_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

fn resolve_ref<'a>(root: &'a JsonObject, reference: &str) -> Option<&'a Value> {
    let (section, name) = reference.strip_prefix("#/")?.split_once('/')?;
    root.get(section)?.get(name)
}

fn is_null_schema(node: &Value) -> bool {
    node.get("type").and_then(Value::as_str) == Some("null")
}

/// The schema a wrapper node stands for: a `$ref`, or the single non-null
/// branch of `allOf`/`anyOf`/`oneOf`.
fn inner<'a>(root: &'a JsonObject, node: &'a Value) -> Option<&'a Value> {
    if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        return resolve_ref(root, reference);
    }
    for key in ["allOf", "anyOf", "oneOf"] {
        if let Some(branches) = node.get(key).and_then(Value::as_array) {
            let mut candidates = branches.iter().filter(|b| !is_null_schema(b));
            if let (Some(only), None) = (candidates.next(), candidates.next()) {
                if only.get("const").is_none() {
                    return Some(only);
                }
            }
        }
    }
    None
}

/// First value of `key` along the wrapper chain, outermost first.
fn find<'a>(root: &'a JsonObject, node: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = node;
    for _ in 0..8 {
        if let Some(value) = current.get(key) {
            return Some(value);
        }
        current = inner(root, current)?;
    }
    None
}

fn primary_type(value: &Value) -> Option<&str> {
    match value {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => types.iter().filter_map(Value::as_str).find(|t| *t != "null"),
        _ => None,
    }
}

fn kind_of(root: &JsonObject, node: &Value) -> ParamKind {
    match find(root, node, "type").and_then(primary_type) {
        Some("boolean") => ParamKind::Boolean,
        Some("integer") => ParamKind::Integer,
        Some("number") => ParamKind::Number,
        Some("object") => ParamKind::Object,
        Some("array") => {
            let items = find(root, node, "items");
            let item_type = items.and_then(|i| find(root, i, "type")).and_then(primary_type);
            if item_type == Some("string") {
                ParamKind::StringArray
            } else {
                ParamKind::Array
            }
        }
        _ => ParamKind::String,
    }
}

fn allowed_values(root: &JsonObject, node: &Value) -> Vec<String> {
    let mut current = Some(node);
    while let Some(schema) = current {
        if let Some(values) = schema.get("enum").and_then(Value::as_array) {
            return values.iter().filter_map(Value::as_str).map(str::to_string).collect();
        }
        for key in ["oneOf", "anyOf"] {
            if let Some(branches) = schema.get(key).and_then(Value::as_array) {
                let consts: Vec<String> = branches
                    .iter()
                    .filter_map(|b| b.get("const").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect();
                if !consts.is_empty() {
                    return consts;
                }
            }
        }
        current = inner(root, schema);
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::minimal_arguments;
    use crate::domains::tools::dispatcher::decode_for;
    use serde_json::json;

    #[test]
    fn test_registry_has_every_tool() {
        assert_eq!(descriptors().len(), 21);
        assert_eq!(all_tools().len(), 21);
        let mut names: Vec<&str> = ToolName::ALL.iter().map(ToolName::as_str).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 21);
    }

    #[test]
    fn test_name_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
            assert_eq!(tool.descriptor().name, tool);
        }
        assert!("install_linkerd".parse::<ToolName>().is_err());
    }

    #[test]
    fn test_descriptor_index_matches_listing_order() {
        for (index, tool) in ToolName::ALL.into_iter().enumerate() {
            assert_eq!(tool as usize, index);
            assert_eq!(tool.descriptor().name, tool);
            assert_eq!(descriptors()[index].name, tool);
        }
    }

    #[test]
    fn test_every_tool_has_a_category() {
        let listed: usize = ToolCategory::ALL.iter().map(|c| c.tools().count()).sum();
        assert_eq!(listed, ToolName::ALL.len());
    }

    #[test]
    fn test_required_fields_from_schema() {
        let connectivity = describe("test_connectivity").unwrap();
        let mut required: Vec<&str> = connectivity.required().collect();
        required.sort();
        assert_eq!(required, vec!["source_pod", "target_port", "target_service"]);

        let exec = describe("exec_pod_command").unwrap();
        let mut required: Vec<&str> = exec.required().collect();
        required.sort();
        assert_eq!(required, vec!["command", "pod_name"]);

        assert_eq!(describe("list_contexts").unwrap().required().count(), 0);
    }

    #[test]
    fn test_install_istio_defaults_advertised() {
        let install = describe("install_istio").unwrap();
        assert_eq!(install.parameter("namespace").unwrap().default, Some(json!("istio-system")));
        assert_eq!(install.parameter("timeout").unwrap().default, Some(json!("5m")));
        assert_eq!(install.parameter("install_cni").unwrap().kind, ParamKind::Boolean);
        assert_eq!(install.parameter("values").unwrap().kind, ParamKind::Object);
    }

    #[test]
    fn test_protocol_enumeration_advertised() {
        let protocol = describe("test_connectivity").unwrap().parameter("protocol").unwrap().clone();
        assert_eq!(protocol.allowed, vec!["http", "https", "tcp"]);
        assert_eq!(protocol.default, Some(json!("http")));
    }

    #[test]
    fn test_ranges_advertised() {
        let logs = describe("get_pod_logs").unwrap();
        let lines = logs.parameter("lines").unwrap();
        assert_eq!(lines.kind, ParamKind::Integer);
        assert_eq!(lines.minimum, Some(1));
        assert_eq!(lines.maximum, Some(10_000));

        let tables = describe("get_iptables_rules").unwrap().parameter("tables").unwrap().clone();
        assert_eq!(tables.kind, ParamKind::StringArray);
    }

    /// The schema's advertised defaults are exactly what decoding produces.
    #[test]
    fn test_schema_defaults_match_decoded_defaults() {
        for tool in ToolName::ALL {
            let minimal = minimal_arguments(tool);
            let decoded = decode_for(tool, minimal.clone())
                .unwrap_or_else(|e| panic!("{} rejected its minimal arguments: {}", tool, e));
            for param in &tool.descriptor().parameters {
                // Caller-supplied fields carry no default to compare against.
                if minimal.get(&param.name).is_some() {
                    continue;
                }
                if let Some(default) = &param.default {
                    assert_eq!(
                        decoded.get(&param.name),
                        Some(default),
                        "{}.{} default drifted",
                        tool,
                        param.name
                    );
                }
            }
        }
    }

    /// Omitting any single required field is rejected with that field's name.
    #[test]
    fn test_each_required_field_is_enforced() {
        for tool in ToolName::ALL {
            let minimal = minimal_arguments(tool);
            for field in tool.descriptor().required() {
                let mut args = minimal.clone();
                args.as_object_mut().unwrap().remove(field);
                let err = decode_for(tool, args).unwrap_err();
                assert!(
                    err.to_string().contains(field),
                    "{} without {} gave: {}",
                    tool,
                    field,
                    err
                );
            }
        }
    }
}
