//! Running one connectivity attempt and interpreting its output.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::domains::tools::ToolContext;
use crate::domains::tools::definitions::common::PodInfo;

/// Container the attempts run in when the pod has one by this name.
pub const CLIENT_CONTAINER: &str = "sleep";

/// `curl -w` trailer; curl expands the `\n` escapes itself.
const CURL_TRAILER: &str = "\\nHTTP_CODE:%{http_code}\\nTIME_TOTAL:%{time_total}\\n";

/// Outcome of one attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptResult {
    pub source: PodInfo,
    pub destination: PodInfo,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub response: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub duration: String,
    pub command: String,
    pub timestamp: DateTime<Utc>,
}

/// `curl` invocation reporting status code and total time.
pub fn curl_command(url: &str, method: Option<&str>, timeout_secs: u32) -> Vec<String> {
    let mut command = vec!["curl".to_string(), "-s".to_string(), "-w".to_string(), CURL_TRAILER.to_string()];
    if let Some(method) = method {
        command.push("-X".to_string());
        command.push(method.to_string());
    }
    command.extend([
        "--connect-timeout".to_string(),
        timeout_secs.to_string(),
        url.to_string(),
    ]);
    command
}

/// Status code from the `HTTP_CODE:` trailer, when present and numeric.
pub fn parse_http_code(output: &str) -> Option<u16> {
    let (_, rest) = output.split_once("HTTP_CODE:")?;
    rest.lines().next()?.trim().parse().ok()
}

/// The client container of `pod`: `sleep` when present, else the first one.
pub fn client_container(pod: &crate::cluster::Pod) -> String {
    if pod.has_container(CLIENT_CONTAINER) {
        return CLIENT_CONTAINER.to_string();
    }
    pod.first_container().unwrap_or(CLIENT_CONTAINER).to_string()
}

/// Run `command` in the source pod and classify the result.
///
/// Exec failures are a failed attempt, not a tool error. For HTTP attempts a
/// parsed status code decides success (2xx and 3xx pass).
pub async fn run_attempt(
    ctx: &ToolContext,
    source: &PodInfo,
    container: &str,
    destination: PodInfo,
    command: Vec<String>,
    http: bool,
    timeout: Duration,
) -> AttemptResult {
    let timestamp = Utc::now();
    let started = Instant::now();
    let outcome = ctx
        .cluster
        .exec(&source.namespace, &source.name, container, &command, Some(timeout))
        .await;
    let elapsed = started.elapsed();

    let mut result = AttemptResult {
        source: source.clone(),
        destination,
        success: false,
        status_code: None,
        response: String::new(),
        error: String::new(),
        duration: format!("{:?}", elapsed),
        command: command.join(" "),
        timestamp,
    };

    match outcome {
        Ok(output) => {
            result.success = true;
            if http {
                if let Some(code) = parse_http_code(&output) {
                    result.status_code = Some(code);
                    result.success = (200..400).contains(&code);
                }
            }
            result.response = output;
        }
        Err(e) => result.error = e.to_string(),
    }
    result
}
