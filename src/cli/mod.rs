//! Command-line interface for meshpilot.
//!
//! Without arguments the binary serves MCP over the configured transport.
//! The flags below run a single tool, list the catalog, or describe one tool;
//! the text they print is built in [`help`], [`direct`] and [`presenter`].

pub mod direct;
pub mod help;
pub mod presenter;

use clap::{CommandFactory, FromArgMatches, Parser};
use std::process::ExitCode;

/// meshpilot - Kubernetes and Istio management MCP server
#[derive(Debug, Parser)]
#[command(name = "meshpilot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execute a single tool and print its result
    #[arg(long, value_name = "NAME")]
    pub tool: Option<String>,

    /// JSON arguments for the tool (defaults to '{}')
    #[arg(long, value_name = "JSON", requires = "tool")]
    pub args: Option<String>,

    /// JSON arguments given without --args
    #[arg(value_name = "JSON", requires = "tool", conflicts_with = "args")]
    pub raw_args: Option<String>,

    /// List all available tools
    #[arg(long, conflicts_with_all = ["tool", "tool_help"])]
    pub list_tools: bool,

    /// Show detailed help for a specific tool
    #[arg(long, value_name = "NAME", conflicts_with = "tool")]
    pub tool_help: Option<String>,
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Serve,
    ListTools,
    ToolHelp(String),
    Run {
        tool: String,
        args: Option<String>,
        raw_args: Option<String>,
    },
}

impl Cli {
    /// Parse the process arguments, with the tool catalog appended to `--help`.
    pub fn parse_with_catalog() -> Self {
        let matches = Self::command().after_help(help::overview()).get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    pub fn action(&self) -> Action {
        if self.list_tools {
            return Action::ListTools;
        }
        if let Some(name) = &self.tool_help {
            return Action::ToolHelp(name.clone());
        }
        match &self.tool {
            Some(tool) => Action::Run {
                tool: tool.clone(),
                args: self.args.clone(),
                raw_args: self.raw_args.clone(),
            },
            None => Action::Serve,
        }
    }
}

/// Text produced by a single-shot command, and whether it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub text: String,
    pub success: bool,
}

impl Report {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}
