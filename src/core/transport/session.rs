//! Line-delimited session loop shared by the stdio and TCP transports.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::TransportResult;
use super::jsonrpc::process_message;
use crate::core::McpServer;

/// Serve one peer until its input ends or `shutdown` fires.
///
/// Messages are handled strictly one at a time, so responses leave in the
/// order requests arrived. Cancellation is only observed between messages:
/// a call that is already running completes and its response is written.
pub async fn serve_lines<R, W>(
    server: &McpServer,
    reader: R,
    mut writer: W,
    shutdown: CancellationToken,
) -> TransportResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Session stopped by shutdown");
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            debug!("Input closed");
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        if let Some(response) = process_message(server, message).await {
            let mut payload = serde_json::to_string(&response)?;
            payload.push('\n');
            writer.write_all(payload.as_bytes()).await?;
            writer.flush().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, RunMode};
    use crate::domains::tools::ToolDispatcher;
    use crate::testing::{FakeCluster, FakeHelm, tool_context};
    use serde_json::Value;
    use std::sync::Arc;
    use tokio_test::io::Builder;

    fn server() -> McpServer {
        let context = tool_context(
            Arc::new(FakeCluster::populated()),
            Arc::new(FakeHelm::with_istio_releases()),
        );
        McpServer::new(Config::for_mode(RunMode::Protocol), ToolDispatcher::new(context))
    }

    fn responses(output: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_ping_written_as_one_line() {
        let reader = Builder::new()
            .read(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
            .build();
        let writer = Builder::new()
            .write(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n")
            .build();

        serve_lines(&server(), reader, writer, CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_responses_follow_request_order() {
        let reader = Builder::new()
            .read(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n")
            .read(b"\n   \n")
            .read(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n")
            .read(b"{broken\n")
            .read(b"{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"tools/call\",\"params\":{\"name\":\"list_contexts\"}}\n")
            .read(b"{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"tools/call\",\"params\":{\"name\":\"get_pod_logs\",\"arguments\":{\"pod_name\":\"ghost\"}}}")
            .build();
        let mut output = Vec::new();

        serve_lines(&server(), reader, &mut output, CancellationToken::new())
            .await
            .unwrap();

        let responses = responses(&output);
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["error"]["code"], -32700);
        assert_eq!(responses[2]["id"], 3);
        assert_eq!(responses[2]["result"]["isError"], false);
        assert_eq!(responses[3]["id"], 4);
        assert_eq!(responses[3]["result"]["isError"], true);
        let text = responses[3]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Failed to get pod"));
    }

    #[tokio::test]
    async fn test_cancelled_session_reads_nothing() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let reader = Builder::new().build();
        let mut output = Vec::new();

        serve_lines(&server(), reader, &mut output, shutdown).await.unwrap();
        assert!(output.is_empty());
    }
}
