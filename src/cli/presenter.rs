//! Human-readable rendering of tool results for the single-shot front-end.
//!
//! Rendering is a pure function of the tool and its result. Results that do
//! not decode as JSON are printed verbatim under a title.

use rmcp::model::{CallToolResult, RawContent};
use serde_json::Value;
use std::fmt::{self, Write};

use crate::domains::tools::ToolName;

/// Render `result` of `tool` for a terminal.
pub fn render(tool: ToolName, result: &CallToolResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_result(&mut out, tool, result);
    out
}

fn write_result(out: &mut String, tool: ToolName, result: &CallToolResult) -> fmt::Result {
    let text = first_text(result).unwrap_or_default();

    if result.is_error.unwrap_or(false) {
        return writeln!(out, "❌ Error: {}", text);
    }

    let Ok(data) = serde_json::from_str::<Value>(text) else {
        writeln!(out, "📋 {} Result:", title(tool))?;
        return writeln!(out, "{}", text);
    };

    match tool {
        ToolName::TestConnectivity | ToolName::TestSleepToHttpbin => connectivity(out, &data),
        ToolName::ListContexts => contexts(out, &data),
        ToolName::CheckIstioStatus => istio_status(out, &data),
        ToolName::GetClusterInfo => cluster_info(out, &data),
        ToolName::GetPodLogs => pod_logs(out, &data),
        ToolName::GetIstioProxyLogs => proxy_logs(out, &data),
        ToolName::ExecPodCommand => exec_output(out, &data),
        ToolName::CheckSailStatus => sail_status(out, &data),
        _ => generic(out, tool, &data),
    }
}

fn first_text(result: &CallToolResult) -> Option<&str> {
    result.content.iter().find_map(|c| match &c.raw {
        RawContent::Text(t) => Some(t.text.as_str()),
        _ => None,
    })
}

/// `get_pod_logs` -> `Get Pod Logs`.
fn title(tool: ToolName) -> String {
    tool.as_str()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A JSON scalar as plain text; strings lose their quotes.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|v| !v.is_null())
}

fn heading(out: &mut String, text: &str, rule: usize) -> fmt::Result {
    writeln!(out, "{}", text)?;
    writeln!(out, "{}\n", "═".repeat(rule))
}

fn issues(out: &mut String, data: &Value) -> fmt::Result {
    let Some(list) = field(data, "issues").and_then(Value::as_array) else {
        return Ok(());
    };
    if list.is_empty() {
        return Ok(());
    }
    writeln!(out, "⚠️  Issues:")?;
    for issue in list {
        writeln!(out, "   • {}", plain(issue))?;
    }
    Ok(())
}

fn connectivity(out: &mut String, data: &Value) -> fmt::Result {
    heading(out, "🔗 Connectivity Test Results", 31)?;

    if let Some(summary) = field(data, "summary") {
        writeln!(out, "📊 {}\n", plain(summary))?;
    }

    let results = field(data, "results").and_then(Value::as_array);
    for (i, result) in results.into_iter().flatten().enumerate() {
        writeln!(out, "🧪 Test {}:", i + 1)?;
        for (key, label) in [("source", "📤 Source"), ("destination", "📥 Target")] {
            if let Some(pod) = field(result, key) {
                writeln!(
                    out,
                    "  {}: {} ({})",
                    label,
                    field(pod, "name").map(plain).unwrap_or_default(),
                    field(pod, "namespace").map(plain).unwrap_or_default()
                )?;
                if let Some(ip) = field(pod, "ip") {
                    writeln!(out, "       IP: {}", plain(ip))?;
                }
            }
        }

        if field(result, "success").and_then(Value::as_bool) == Some(true) {
            write!(out, "  ✅ Status: SUCCESS")?;
        } else {
            write!(out, "  ❌ Status: FAILED")?;
        }
        if let Some(code) = field(result, "status_code").and_then(Value::as_u64) {
            write!(out, " (HTTP {})", code)?;
        }
        writeln!(out)?;

        if let Some(duration) = field(result, "duration") {
            writeln!(out, "  ⏱️  Duration: {}", plain(duration))?;
        }
        if let Some(command) = field(result, "command") {
            writeln!(out, "  🔧 Command: {}", plain(command))?;
        }
        if let Some(error) = field(result, "error") {
            writeln!(out, "  ❗ Error: {}", plain(error))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn contexts(out: &mut String, data: &Value) -> fmt::Result {
    heading(out, "🎯 Kubernetes Contexts", 23)?;

    let Some(list) = data.as_array() else {
        return writeln!(out, "📋 Contexts:\n{}", data);
    };
    for context in list {
        let name = field(context, "name").map(plain).unwrap_or_default();
        if field(context, "current").and_then(Value::as_bool) == Some(true) {
            writeln!(out, "➤ {} (current)", name)?;
        } else {
            writeln!(out, "  {}", name)?;
        }
        if let Some(cluster) = field(context, "cluster") {
            writeln!(out, "    Cluster: {}", plain(cluster))?;
        }
        if let Some(user) = field(context, "user") {
            writeln!(out, "    User: {}", plain(user))?;
        }
        if let Some(namespace) = field(context, "namespace").map(plain).filter(|n| !n.is_empty()) {
            writeln!(out, "    Namespace: {}", namespace)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn installed_line(out: &mut String, data: &Value) -> fmt::Result {
    match field(data, "installed").and_then(Value::as_bool) {
        Some(true) => writeln!(out, "✅ Status: Installed"),
        Some(false) => writeln!(out, "❌ Status: Not Installed"),
        None => Ok(()),
    }
}

fn istio_status(out: &mut String, data: &Value) -> fmt::Result {
    heading(out, "🕸️  Istio Service Mesh Status", 31)?;
    installed_line(out, data)?;
    if let Some(version) = field(data, "version") {
        writeln!(out, "🏷️  Version: {}", plain(version))?;
    }
    if let Some(namespace) = field(data, "namespace") {
        writeln!(out, "📦 Namespace: {}\n", plain(namespace))?;
    }

    if let Some(components) = field(data, "components").and_then(Value::as_array) {
        writeln!(out, "🔧 Components:")?;
        for component in components {
            let ready = field(component, "ready").and_then(Value::as_bool) == Some(true);
            writeln!(
                out,
                "  {} {} - {}/{} replicas ready",
                if ready { "✅" } else { "❌" },
                field(component, "name").map(plain).unwrap_or_default(),
                field(component, "available").map(plain).unwrap_or_default(),
                field(component, "replicas").map(plain).unwrap_or_default()
            )?;
        }
    }
    issues(out, data)?;
    writeln!(out)
}

fn sail_status(out: &mut String, data: &Value) -> fmt::Result {
    heading(out, "⛵ Sail Operator Status", 22)?;
    installed_line(out, data)?;
    if let Some(version) = field(data, "version") {
        writeln!(out, "🏷️  Version: {}", plain(version))?;
    }
    if let Some(namespace) = field(data, "namespace") {
        writeln!(out, "📦 Namespace: {}", plain(namespace))?;
    }
    if let (Some(available), Some(replicas)) = (field(data, "available"), field(data, "replicas")) {
        writeln!(out, "🔧 Replicas: {}/{} ready", plain(available), plain(replicas))?;
    }
    issues(out, data)?;
    writeln!(out)
}

fn cluster_info(out: &mut String, data: &Value) -> fmt::Result {
    heading(out, "☸️  Cluster Information", 23)?;
    if let Some(name) = field(data, "name") {
        writeln!(out, "📛 Name: {}", plain(name))?;
    }
    if let Some(server) = field(data, "server") {
        writeln!(out, "🔗 Server: {}", plain(server))?;
    }
    if let Some(version) = field(data, "version") {
        writeln!(out, "🏷️  Version: {}", plain(version))?;
    }
    if let Some(nodes) = field(data, "nodes") {
        writeln!(out, "🖥️  Nodes: {}", plain(nodes))?;
    }
    if let Some(namespaces) = field(data, "namespaces").and_then(Value::as_array) {
        writeln!(out, "📂 Namespaces: {}", namespaces.len())?;
        for namespace in namespaces {
            writeln!(out, "   • {}", plain(namespace))?;
        }
    }
    writeln!(out)
}

fn log_header(out: &mut String, data: &Value) -> fmt::Result {
    if let Some(pod) = field(data, "pod") {
        writeln!(out, "🏷️  Pod: {}", plain(pod))?;
    }
    if let Some(namespace) = field(data, "namespace") {
        writeln!(out, "📦 Namespace: {}", plain(namespace))?;
    }
    if let Some(container) = field(data, "container") {
        writeln!(out, "🔧 Container: {}", plain(container))?;
    }
    if let Some(lines) = field(data, "lines") {
        writeln!(out, "📊 Lines: {}", plain(lines))?;
    }
    if field(data, "truncated").and_then(Value::as_bool) == Some(true) {
        writeln!(out, "⚠️  Logs truncated (showing latest entries)")?;
    }
    Ok(())
}

fn pod_logs(out: &mut String, data: &Value) -> fmt::Result {
    heading(out, "📜 Pod Logs", 11)?;
    log_header(out, data)?;

    let Some(raw) = field(data, "raw_logs").map(plain) else {
        return writeln!(out, "\n📄 No logs available");
    };
    writeln!(out, "\n📄 Logs:\n─────────")?;
    if raw.is_empty() {
        writeln!(out, "(No logs found or logs are empty)")
    } else {
        write!(out, "{}", raw)?;
        if !raw.ends_with('\n') {
            writeln!(out)?;
        }
        Ok(())
    }
}

fn proxy_logs(out: &mut String, data: &Value) -> fmt::Result {
    heading(out, "🕸️  Istio Proxy Logs (Envoy Sidecar)", 36)?;
    log_header(out, data)?;

    let Some(raw) = field(data, "raw_logs").map(plain) else {
        writeln!(out, "\n📄 No proxy logs available")?;
        return writeln!(out, "💡 Tip: Ensure the pod has Istio sidecar injection enabled");
    };
    writeln!(out, "\n📄 Envoy Proxy Logs:\n────────────────────")?;
    if raw.is_empty() {
        return writeln!(out, "(No proxy logs found - pod may not have Istio sidecar)");
    }
    for line in raw.lines().filter(|l| !l.is_empty()) {
        writeln!(out, "{} {}", envoy_marker(line), line)?;
    }
    Ok(())
}

/// Marker for one Envoy log line, by level and then by subject.
fn envoy_marker(line: &str) -> &'static str {
    let has = |needles: [&str; 2]| needles.iter().any(|n| line.contains(n));
    if has(["[error]", "ERROR"]) {
        "❌"
    } else if has(["[warning]", "WARN"]) {
        "⚠️ "
    } else if has(["[info]", "INFO"]) {
        "ℹ️ "
    } else if has(["[debug]", "DEBUG"]) {
        "🔍"
    } else if has(["inbound", "outbound"]) {
        "🌐"
    } else if has(["cluster", "endpoint"]) {
        "🎯"
    } else if has(["listener", "filter"]) {
        "🔧"
    } else {
        "  "
    }
}

fn exec_output(out: &mut String, data: &Value) -> fmt::Result {
    heading(out, "🖥️  Pod Command Execution", 24)?;
    for (key, label) in [
        ("pod", "🏷️  Pod"),
        ("namespace", "📦 Namespace"),
        ("container", "🔧 Container"),
        ("command", "⚡ Command"),
        ("timestamp", "🕐 Executed"),
    ] {
        if let Some(value) = field(data, key) {
            writeln!(out, "{}: {}", label, plain(value))?;
        }
    }

    if field(data, "success").and_then(Value::as_bool) == Some(true) {
        writeln!(out, "✅ Status: Success")?;
    } else {
        writeln!(out, "❌ Status: Failed")?;
    }

    if let Some(output) = field(data, "output").map(plain) {
        writeln!(out, "\n📄 Command Output:\n──────────────────")?;
        if output.is_empty() {
            writeln!(out, "(No output)")?;
        }
        for line in output.lines() {
            writeln!(out, "{} {}", output_marker(line), line)?;
        }
    }

    if let Some(error) = field(data, "error") {
        writeln!(out, "\n❌ Error Details:\n─────────────────")?;
        writeln!(out, "{}", plain(error))?;
    }
    Ok(())
}

/// Marker for network-looking command output (`ip addr` and friends).
fn output_marker(line: &str) -> &'static str {
    if line.is_empty() {
        ""
    } else if [": lo:", ": eth", ": wlan"].iter().any(|n| line.contains(n)) {
        "🌐"
    } else if line.contains("inet ") && line.contains("scope") {
        "🔗"
    } else if line.contains("link/") {
        "🔧"
    } else if line.contains("valid_lft") || line.contains("preferred_lft") {
        "⏱️ "
    } else {
        "  "
    }
}

fn generic(out: &mut String, tool: ToolName, data: &Value) -> fmt::Result {
    let title = title(tool);
    writeln!(out, "📋 {} Result", title)?;
    writeln!(out, "{}\n", "═".repeat(title.chars().count() + 9))?;
    match serde_json::to_string_pretty(data) {
        Ok(pretty) => writeln!(out, "{}", pretty),
        Err(_) => writeln!(out, "{}", data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;
    use serde_json::json;

    fn success(value: Value) -> CallToolResult {
        CallToolResult::success(vec![Content::text(value.to_string())])
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title(ToolName::GetIptablesRules), "Get Iptables Rules");
    }

    #[test]
    fn test_error_result() {
        let result = CallToolResult::error(vec![Content::text("Unknown tool: nope")]);
        assert_eq!(render(ToolName::ListContexts, &result), "❌ Error: Unknown tool: nope\n");
    }

    #[test]
    fn test_plain_text_result() {
        let result = CallToolResult::success(vec![Content::text("Istio installed successfully")]);
        assert_eq!(
            render(ToolName::InstallIstio, &result),
            "📋 Install Istio Result:\nIstio installed successfully\n"
        );
    }

    #[test]
    fn test_connectivity_breakdown() {
        let result = success(json!({
            "summary": "Connectivity test from sleep-1 to httpbin:8000 - SUCCESS",
            "results": [{
                "source": {"name": "sleep-1", "namespace": "default", "ip": "10.0.0.1"},
                "destination": {"name": "httpbin", "namespace": "default"},
                "success": true,
                "status_code": 200,
                "duration": "12ms",
                "command": "curl -s http://httpbin:8000/"
            }]
        }));
        let text = render(ToolName::TestConnectivity, &result);
        assert!(text.contains("🧪 Test 1:"));
        assert!(text.contains("📤 Source: sleep-1 (default)\n       IP: 10.0.0.1"));
        assert!(text.contains("📥 Target: httpbin (default)\n  ✅ Status: SUCCESS (HTTP 200)"));
        assert!(text.contains("⏱️  Duration: 12ms"));
    }

    #[test]
    fn test_context_list_marks_current() {
        let result = success(json!([
            {"name": "kind-a", "cluster": "a", "user": "u", "namespace": "", "current": false},
            {"name": "kind-b", "cluster": "b", "user": "u", "namespace": "mesh", "current": true}
        ]));
        let text = render(ToolName::ListContexts, &result);
        assert!(text.contains("  kind-a\n    Cluster: a\n    User: u\n\n"));
        assert!(text.contains("➤ kind-b (current)"));
        assert!(text.contains("    Namespace: mesh"));
    }

    #[test]
    fn test_istio_status_components() {
        let result = success(json!({
            "installed": true,
            "version": "1.26.3",
            "namespace": "istio-system",
            "components": [{"name": "istiod", "ready": true, "replicas": 1, "available": 1}],
            "issues": []
        }));
        let text = render(ToolName::CheckIstioStatus, &result);
        assert!(text.contains("✅ Status: Installed"));
        assert!(text.contains("  ✅ istiod - 1/1 replicas ready"));
        assert!(!text.contains("Issues"));
    }

    #[test]
    fn test_proxy_log_lines_are_tagged() {
        let result = success(json!({
            "pod": "sleep-1",
            "raw_logs": "2024-01-01 [warning] upstream slow\n2024-01-01 [error] reset\nplain line\n"
        }));
        let text = render(ToolName::GetIstioProxyLogs, &result);
        assert!(text.contains("⚠️  2024-01-01 [warning] upstream slow"));
        assert!(text.contains("❌ 2024-01-01 [error] reset"));
        assert!(text.contains("   plain line"));
    }

    #[test]
    fn test_pod_logs_empty() {
        let result = success(json!({"pod": "p", "raw_logs": "", "truncated": true}));
        let text = render(ToolName::GetPodLogs, &result);
        assert!(text.contains("⚠️  Logs truncated"));
        assert!(text.contains("(No logs found or logs are empty)"));
    }

    #[test]
    fn test_exec_failure_details() {
        let result = success(json!({
            "pod": "sleep-1",
            "command": "ls /missing",
            "success": false,
            "error": "exit code 2"
        }));
        let text = render(ToolName::ExecPodCommand, &result);
        assert!(text.contains("❌ Status: Failed"));
        assert!(text.contains("❌ Error Details:\n─────────────────\nexit code 2"));
    }

    #[test]
    fn test_generic_pretty_json() {
        let result = success(json!({"namespace": "default", "count": 0}));
        let text = render(ToolName::GetNetworkPolicies, &result);
        assert!(text.starts_with("📋 Get Network Policies Result\n"));
        assert!(text.contains("  \"count\": 0"));
    }
}
