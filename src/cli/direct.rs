//! Single-shot execution: run one tool from the command line and render its result.

use rmcp::model::RawContent;
use tracing::info;

use super::{Report, help, presenter};
use crate::domains::tools::{ToolDispatcher, ToolName};

/// Run `tool` once.
///
/// `args` is the `--args` value; `raw_args` is a positional value given
/// instead of it, accepted only when it looks like a JSON object.
pub async fn run(
    dispatcher: &ToolDispatcher,
    tool: &str,
    args: Option<&str>,
    raw_args: Option<&str>,
) -> Report {
    let Ok(name) = tool.parse::<ToolName>() else {
        return Report::failed(help::unknown_tool(tool));
    };

    let mut text = String::new();
    let arguments = match (args, raw_args) {
        (Some(args), _) => args.to_string(),
        (None, Some(raw)) if looks_like_object(raw) => {
            text.push_str("ℹ️  Detected JSON arguments (consider using --args flag for clarity)\n");
            raw.to_string()
        }
        (None, Some(raw)) => {
            let mut message = format!("❌ Invalid usage. Did you mean: --args '{}'?\n\n", raw);
            message.push_str(&help::parameters(name.descriptor()));
            return Report::failed(message);
        }
        (None, None) => {
            text.push_str(&format!(
                "ℹ️  Executing tool '{}' with default parameters\n",
                name
            ));
            text.push_str(&help::parameters(name.descriptor()));
            text.push('\n');
            "{}".to_string()
        }
    };

    info!("Executing {} directly", name);
    let result = dispatcher.execute_json(name.as_str(), &arguments).await;

    if result.is_error.unwrap_or(false) {
        let message = result
            .content
            .iter()
            .filter_map(|c| match &c.raw {
                RawContent::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        text.push_str(&format!("❌ Error: {}\n", message));
        return Report::failed(text);
    }

    text.push_str(&presenter::render(name, &result));
    Report::ok(text)
}

fn looks_like_object(raw: &str) -> bool {
    let raw = raw.trim();
    raw.starts_with('{') && raw.ends_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCluster, FakeHelm, tool_context};
    use std::sync::Arc;

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(tool_context(
            Arc::new(FakeCluster::populated()),
            Arc::new(FakeHelm::default()),
        ))
    }

    #[tokio::test]
    async fn test_unknown_tool_suggests_and_fails() {
        let report = run(&dispatcher(), "get_logs", None, None).await;
        assert!(!report.success);
        assert!(report.text.contains("❌ Unknown tool: get_logs"));
        assert!(report.text.contains("get_pod_logs"));
    }

    #[tokio::test]
    async fn test_default_arguments_show_parameters() {
        let report = run(&dispatcher(), "list_contexts", None, None).await;
        assert!(report.success, "{}", report.text);
        assert!(report.text.starts_with("ℹ️  Executing tool 'list_contexts' with default parameters"));
        assert!(report.text.contains("📋 Parameters for 'list_contexts'"));
        assert!(report.text.contains("🎯 Kubernetes Contexts"));
    }

    #[tokio::test]
    async fn test_positional_json_is_accepted() {
        let report = run(&dispatcher(), "list_contexts", None, Some("{}")).await;
        assert!(report.success, "{}", report.text);
        assert!(report.text.contains("Detected JSON arguments"));
    }

    #[tokio::test]
    async fn test_positional_non_json_is_rejected() {
        let cluster = Arc::new(FakeCluster::populated());
        let dispatcher = ToolDispatcher::new(tool_context(cluster.clone(), Arc::new(FakeHelm::default())));
        let report = run(&dispatcher, "get_pod_logs", None, Some("pod_name=x")).await;
        assert!(!report.success);
        assert!(report.text.contains("Did you mean: --args 'pod_name=x'?"));
        assert!(report.text.contains("Required: pod_name"));
        assert_eq!(cluster.call_count(), 0);
    }

    #[tokio::test]
    async fn test_error_result_fails() {
        let report = run(&dispatcher(), "get_pod_logs", Some("{}"), None).await;
        assert!(!report.success);
        assert_eq!(
            report.text,
            "❌ Error: Missing required parameter: pod_name\n"
        );
    }

    #[tokio::test]
    async fn test_malformed_arguments_fail() {
        let report = run(&dispatcher(), "list_contexts", Some("{not json"), None).await;
        assert!(!report.success);
        assert!(report.text.starts_with("❌ Error: Invalid parameters"));
    }

    #[tokio::test]
    async fn test_unavailable_client() {
        let report = run(&ToolDispatcher::unavailable(), "list_contexts", Some("{}"), None).await;
        assert!(!report.success);
        assert!(report.text.contains("Kubernetes client not available"));
    }
}
