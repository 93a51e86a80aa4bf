//! MeshPilot MCP Server Library
//!
//! Exposes Kubernetes and Istio operations (mesh installation, sample
//! workloads, connectivity checks, logs and network inspection) as MCP tools.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the server and its transports
//! - **cluster**: `kubectl` and `helm` collaborators behind narrow traits
//! - **domains**: the tool registry, argument contracts and dispatcher
//! - **cli**: single-shot execution, help text and result rendering
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meshpilot_mcp_server::cluster::ProcessRunner;
//! use meshpilot_mcp_server::core::{Config, RunMode};
//! use meshpilot_mcp_server::domains::tools::{ToolContext, ToolDispatcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env(RunMode::Interactive);
//!     let context = ToolContext::connect(&config.cluster, Arc::new(ProcessRunner)).await?;
//!     let dispatcher = ToolDispatcher::new(context);
//!     let result = dispatcher.execute_json("list_contexts", "{}").await;
//!     println!("{:?}", result);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod cluster;
pub mod core;
pub mod domains;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
