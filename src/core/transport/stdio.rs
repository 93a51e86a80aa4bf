//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.
//! One JSON-RPC message per line in each direction; logs go to stderr.

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::TransportResult;
use super::session::serve_lines;
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Serve stdin/stdout until stdin closes or shutdown is requested.
    pub async fn run(server: McpServer, shutdown: CancellationToken) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        serve_lines(&server, tokio::io::stdin(), tokio::io::stdout(), shutdown).await?;

        info!("STDIO transport finished");
        Ok(())
    }
}
