//! Tools domain module.
//!
//! Tools are the executable operations MCP clients call. Every tool is a
//! typed argument struct plus an async `execute`, and is reachable through
//! one dispatch path shared by all transports and the command line.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `registry.rs` - Tool names, categories and schema-derived descriptors
//! - `dispatcher.rs` - Name lookup, argument decoding and execution
//! - `context.rs` - Cluster collaborators handed to every tool
//! - `params.rs` - Argument decoding and validation helpers
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/<area>/` with its params and `ToolDefinition`
//! 2. Export it from `definitions/mod.rs`
//! 3. Add a `ToolName` variant and a dispatch arm; both matches are exhaustive

mod context;
pub mod definitions;
mod dispatcher;
mod error;
pub mod params;
pub mod registry;

pub use context::{ToolContext, ToolDefinition, tool_schema};
pub use dispatcher::ToolDispatcher;
pub use error::ToolError;
pub use params::ToolParams;
pub use registry::{
    ParamKind, ParameterSpec, ToolCategory, ToolDescriptor, ToolName, all_tools, describe,
    descriptors,
};
