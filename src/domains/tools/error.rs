//! Tool-specific error types.
//!
//! Every variant is rendered into an error [`CallToolResult`] at the point it
//! is detected; none of them escape the dispatcher.

use rmcp::model::{CallToolResult, Content};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// The argument payload does not have the expected shape.
    #[error("Invalid parameters: {0}")]
    InvalidArguments(String),

    /// A required argument is absent or empty.
    #[error("Missing required parameter: {0}")]
    MissingField(String),

    /// An argument is present but outside its allowed values.
    #[error("Invalid value for '{field}': {reason}")]
    OutOfRange { field: String, reason: String },

    /// The cluster client could not be established at startup.
    #[error("Kubernetes client not available. Please ensure kubeconfig is properly configured.")]
    ClientUnavailable,

    /// The tool's external operation failed.
    #[error("{0}")]
    ExecutionFailed(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "missing field" error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create a new "out of range" error.
    pub fn out_of_range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Failure of an external step, prefixed with what was being attempted.
    pub fn step(context: &str, err: impl std::fmt::Display) -> Self {
        Self::ExecutionFailed(format!("{}: {}", context, err))
    }

    /// Render as an error result carrying a single diagnostic.
    pub fn into_result(self) -> CallToolResult {
        warn!("{}", self);
        CallToolResult::error(vec![Content::text(self.to_string())])
    }
}

impl From<ToolError> for CallToolResult {
    fn from(err: ToolError) -> Self {
        err.into_result()
    }
}
