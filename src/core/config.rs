//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! defaults and environment variables (a `.env` file is honoured).

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// How the process was started.
///
/// Decided once in `main` and turned into concrete configuration values;
/// nothing else in the crate inspects the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Driven by an MCP client over a pipe; stderr should stay quiet.
    Protocol,
    /// Started by a person, either as a server in a terminal or for a single tool run.
    Interactive,
}

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// External `kubectl`/`helm` settings.
    pub cluster: ClusterConfig,

    /// Process lifetime settings.
    pub runtime: RuntimeConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Log output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Output encoding.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Defaults for a run mode: errors only under an MCP client, structured
    /// info-level logs for people.
    pub fn for_mode(mode: RunMode) -> Self {
        match mode {
            RunMode::Protocol => Self {
                level: "error".to_string(),
                format: LogFormat::Text,
            },
            RunMode::Interactive => Self {
                level: "info".to_string(),
                format: LogFormat::Json,
            },
        }
    }
}

/// Settings for the external cluster tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Path or name of the `kubectl` binary.
    pub kubectl_path: String,

    /// Path or name of the `helm` binary.
    pub helm_path: String,

    /// Explicit kubeconfig file; `kubectl`'s own discovery applies when unset.
    pub kubeconfig: Option<PathBuf>,

    /// Context to bind to instead of the kubeconfig's current context.
    pub context: Option<String>,

    /// Upper bound for a single get/list/apply/delete call, in seconds.
    pub request_timeout_secs: u64,

    /// Image used for ephemeral debug containers.
    pub debug_image: String,

    /// Upper bound for creating a debug container, and for waiting on its output.
    pub debug_timeout_secs: u64,

    /// Delay between polls of a debug container's logs.
    pub debug_poll_interval_secs: u64,
}

impl ClusterConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn debug_timeout(&self) -> Duration {
        Duration::from_secs(self.debug_timeout_secs)
    }

    pub fn debug_poll_interval(&self) -> Duration {
        Duration::from_secs(self.debug_poll_interval_secs)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kubectl_path: "kubectl".to_string(),
            helm_path: "helm".to_string(),
            kubeconfig: None,
            context: None,
            request_timeout_secs: 60,
            debug_image: "istio/base".to_string(),
            debug_timeout_secs: 30,
            debug_poll_interval_secs: 2,
        }
    }
}

/// Process lifetime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Bound the server's lifetime (`MESHPILOT_DEMO=true`).
    pub demo_mode: bool,

    /// Lifetime of a demo-mode server, in seconds.
    pub demo_timeout_secs: u64,
}

impl RuntimeConfig {
    pub fn demo_timeout(&self) -> Duration {
        Duration::from_secs(self.demo_timeout_secs)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            demo_mode: false,
            demo_timeout_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_mode(RunMode::Interactive)
    }
}

impl Config {
    /// Default configuration for the given run mode.
    pub fn for_mode(mode: RunMode) -> Self {
        Self {
            server: ServerConfig {
                name: "meshpilot".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig::for_mode(mode),
            transport: TransportConfig::default(),
            cluster: ClusterConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix (`MCP_SERVER_NAME`,
    /// `MCP_LOG_LEVEL`, `MCP_KUBECTL_PATH`, ...). `KUBECONFIG` and
    /// `MESHPILOT_DEMO` are read under their conventional names.
    pub fn from_env(mode: RunMode) -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::for_mode(mode);

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("MCP_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => config.logging.format = LogFormat::Json,
                "text" => config.logging.format = LogFormat::Text,
                _ => {}
            }
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        if let Ok(path) = std::env::var("MCP_KUBECTL_PATH") {
            config.cluster.kubectl_path = path;
        }

        if let Ok(path) = std::env::var("MCP_HELM_PATH") {
            config.cluster.helm_path = path;
        }

        if let Ok(path) = std::env::var("KUBECONFIG") {
            // kubectl understands path lists itself; only pin a single file.
            if !path.is_empty() && !path.contains(':') {
                config.cluster.kubeconfig = Some(PathBuf::from(path));
            }
        }

        if let Ok(context) = std::env::var("MCP_KUBE_CONTEXT") {
            if !context.is_empty() {
                info!("Kubernetes context pinned to '{}'", context);
                config.cluster.context = Some(context);
            }
        }

        if let Some(secs) = env_u64("MCP_REQUEST_TIMEOUT") {
            config.cluster.request_timeout_secs = secs;
        }

        if let Ok(image) = std::env::var("MCP_DEBUG_IMAGE") {
            config.cluster.debug_image = image;
        }

        if let Some(secs) = env_u64("MCP_DEBUG_TIMEOUT") {
            config.cluster.debug_timeout_secs = secs;
        }

        if let Ok(demo) = std::env::var("MESHPILOT_DEMO") {
            config.runtime.demo_mode = demo.eq_ignore_ascii_case("true");
        }

        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
