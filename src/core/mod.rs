//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server,
//! including error handling, configuration, server lifecycle management,
//! and transport layer abstractions.

pub mod config;
pub mod error;
pub mod server;
pub mod shutdown;
pub mod transport;

pub use config::{Config, RunMode};
pub use error::{Error, Result};
pub use server::McpServer;
pub use shutdown::install_signal_handlers;
pub use transport::{TransportConfig, TransportService};
