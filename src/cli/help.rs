//! Help and listing text, derived from the tool registry.

use serde_json::{Map, Value, json};
use std::fmt::Write;

use crate::domains::tools::{ParamKind, ParameterSpec, ToolCategory, ToolDescriptor, ToolName};

const RULE_WIDTH: usize = 50;

/// Text appended to `--help`: examples and the tool categories.
pub fn overview() -> String {
    let mut out = String::from(
        "EXAMPLES:\n    \
         # Start the MCP server (runs until Ctrl+C)\n    \
         meshpilot\n\n    \
         # Start the MCP server in demo mode (30s lifetime)\n    \
         MESHPILOT_DEMO=true meshpilot\n\n    \
         # Execute a tool directly\n    \
         meshpilot --tool list_contexts --args '{}'\n    \
         meshpilot --tool install_istio --args '{\"namespace\":\"istio-system\"}'\n\n\
         TOOL CATEGORIES:\n",
    );
    for category in ToolCategory::ALL {
        let names: Vec<&str> = category.tools().map(|t| t.as_str()).collect();
        let _ = writeln!(out, "    {}: {}", category.title(), names.join(", "));
    }
    out
}

/// The catalog grouped by category.
pub fn list_tools() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n🛠️  Available MeshPilot Tools:");
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');

    for category in ToolCategory::ALL {
        let _ = writeln!(out, "\n{}:", category.title());
        for tool in category.tools() {
            let _ = writeln!(out, "  • {} - {}", tool, tool.descriptor().description);
        }
    }

    out.push_str("\n💡 Usage: meshpilot --tool <tool_name> --args '<json_args>'\n");
    out.push_str("📖 Help:  meshpilot --help\n");
    out
}

/// Detailed help for one tool, or the unknown-tool diagnostic.
pub fn tool_help(name: &str) -> Result<String, String> {
    let tool = name.parse::<ToolName>().map_err(|_| unknown_tool(name))?;
    let descriptor = tool.descriptor();

    let mut out = String::new();
    let _ = writeln!(out, "🛠️  Detailed Help for '{}'", tool);
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    let _ = writeln!(out, "\n📝 Description:\n  {}\n", descriptor.description);
    out.push_str(&parameters(descriptor));
    out.push_str("\n📚 More Help:\n");
    out.push_str("  --help              General help\n");
    out.push_str("  --list-tools        All available tools\n");
    out.push_str("  --tool-help <name>  Help for other tools\n");
    Ok(out)
}

/// "Unknown tool" followed by suggestions.
pub fn unknown_tool(name: &str) -> String {
    let mut out = format!("❌ Unknown tool: {}\n\n", name);
    out.push_str("🔍 Did you mean one of these similar tools?\n");
    let suggestions = similar_tools(name);
    if suggestions.is_empty() {
        out.push_str("  No similar tools found.\n");
    }
    for tool in suggestions {
        let _ = writeln!(out, "  • {}", tool);
    }
    out.push_str("💡 Use --list-tools to see all available tools\n");
    out
}

/// Tools whose name contains `input`, or whose first word `input` contains.
pub fn similar_tools(input: &str) -> Vec<ToolName> {
    ToolName::ALL
        .into_iter()
        .filter(|tool| {
            let name = tool.as_str();
            let head = name.split('_').next().unwrap_or(name);
            name.contains(input) || input.contains(head)
        })
        .collect()
}

/// Required and optional parameters of a tool, with an example payload.
pub fn parameters(descriptor: &ToolDescriptor) -> String {
    let mut out = format!("📋 Parameters for '{}':\n", descriptor.name);

    let (required, optional): (Vec<&ParameterSpec>, Vec<&ParameterSpec>) =
        descriptor.parameters.iter().partition(|p| p.required);

    if required.is_empty() && optional.is_empty() {
        out.push_str("  No parameters required\n");
    }
    if !required.is_empty() {
        let _ = writeln!(out, "  Required: {}", summarize(&required));
    }
    if !optional.is_empty() {
        let _ = writeln!(out, "  Optional: {}", summarize(&optional));
    }
    let _ = writeln!(out, "  Example: --args '{}'", example_arguments(descriptor));
    out
}

fn summarize(params: &[&ParameterSpec]) -> String {
    params
        .iter()
        .map(|p| describe_parameter(p))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_parameter(param: &ParameterSpec) -> String {
    let mut details = vec![param.kind.to_string()];
    if let Some(default) = &param.default {
        details.push(format!("default: {}", default));
    }
    match (param.minimum, param.maximum) {
        (Some(min), Some(max)) => details.push(format!("range: {}..={}", min, max)),
        (Some(min), None) => details.push(format!("min: {}", min)),
        (None, Some(max)) => details.push(format!("max: {}", max)),
        (None, None) => {}
    }
    if !param.allowed.is_empty() {
        details.push(format!("one of: {}", param.allowed.join("|")));
    }
    format!("{} ({})", param.name, details.join(", "))
}

/// Smallest payload accepted by the tool: placeholders for required fields.
pub fn example_arguments(descriptor: &ToolDescriptor) -> Value {
    let mut example = Map::new();
    for param in descriptor.parameters.iter().filter(|p| p.required) {
        example.insert(param.name.clone(), placeholder(param));
    }
    Value::Object(example)
}

fn placeholder(param: &ParameterSpec) -> Value {
    if let Some(allowed) = param.allowed.first() {
        return json!(allowed);
    }
    match param.kind {
        ParamKind::String => json!(format!("<{}>", param.name)),
        ParamKind::Boolean => json!(true),
        ParamKind::Integer | ParamKind::Number => json!(param.minimum.unwrap_or(1)),
        ParamKind::StringArray => json!([format!("<{}>", param.name)]),
        ParamKind::Array => json!([]),
        ParamKind::Object => json!({}),
    }
}
