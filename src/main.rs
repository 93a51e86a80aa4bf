//! MeshPilot Entry Point
//!
//! Parses the command line, loads configuration, initializes logging and
//! either runs a single tool or serves MCP over the configured transport.

use anyhow::Result;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use meshpilot_mcp_server::cli::{Action, Cli, direct, help};
use meshpilot_mcp_server::cluster::ProcessRunner;
use meshpilot_mcp_server::core::config::{LogFormat, LoggingConfig};
use meshpilot_mcp_server::core::{
    Config, McpServer, RunMode, TransportService, install_signal_handlers,
};
use meshpilot_mcp_server::domains::tools::{ToolContext, ToolDispatcher};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse_with_catalog();
    let action = cli.action();

    let mode = if action == Action::Serve && !std::io::stdin().is_terminal() {
        RunMode::Protocol
    } else {
        RunMode::Interactive
    };

    // Load configuration from environment
    let config = Config::from_env(mode);

    // Initialize logging
    init_logging(&config.logging);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(run(config, action, mode));

    // A pending stdin read holds a blocking thread that never returns.
    runtime.shutdown_timeout(Duration::from_secs(1));
    outcome
}

async fn run(config: Config, action: Action, mode: RunMode) -> Result<ExitCode> {
    match action {
        Action::ListTools => {
            print!("{}", help::list_tools());
            Ok(ExitCode::SUCCESS)
        }
        Action::ToolHelp(name) => match help::tool_help(&name) {
            Ok(text) => {
                print!("{}", text);
                Ok(ExitCode::SUCCESS)
            }
            Err(text) => {
                print!("{}", text);
                Ok(ExitCode::FAILURE)
            }
        },
        Action::Run {
            tool,
            args,
            raw_args,
        } => {
            let dispatcher = connect(&config).await;
            let report = direct::run(&dispatcher, &tool, args.as_deref(), raw_args.as_deref()).await;
            print!("{}", report.text);
            Ok(report.exit_code())
        }
        Action::Serve => {
            let dispatcher = connect(&config).await;
            serve(config, dispatcher, mode).await
        }
    }
}

/// Bind the cluster collaborators; an unreachable cluster leaves the tools unavailable.
async fn connect(config: &Config) -> ToolDispatcher {
    match ToolContext::connect(&config.cluster, Arc::new(ProcessRunner)).await {
        Ok(context) => ToolDispatcher::new(context),
        Err(e) => {
            error!("Kubernetes client unavailable: {}", e);
            ToolDispatcher::unavailable()
        }
    }
}

async fn serve(config: Config, dispatcher: ToolDispatcher, mode: RunMode) -> Result<ExitCode> {
    let shutdown = install_signal_handlers();
    let transport = TransportService::new(config.transport.clone());
    let demo_limit = config
        .runtime
        .demo_mode
        .then(|| config.runtime.demo_timeout());

    if mode == RunMode::Interactive {
        print_banner(demo_limit);
    }

    // Create the MCP server
    let server = McpServer::new(config, dispatcher);
    info!("Starting {} v{}", server.name(), server.version());

    let serving = transport.run(server, shutdown.clone());
    match demo_limit {
        Some(limit) => match tokio::time::timeout(limit, serving).await {
            Ok(result) => result?,
            Err(_) => {
                eprintln!(
                    "\n⏰ Demo timeout reached ({}s). Restart without MESHPILOT_DEMO=true for continuous operation.",
                    limit.as_secs()
                );
                return Ok(ExitCode::SUCCESS);
            }
        },
        None => serving.await?,
    }

    if shutdown.is_cancelled() && mode == RunMode::Interactive {
        eprintln!("\n✅ MeshPilot server stopped gracefully");
    }
    info!("Server shutting down");
    Ok(ExitCode::SUCCESS)
}

/// Startup notes for a person at a terminal; stdout stays reserved for protocol traffic.
fn print_banner(demo_limit: Option<Duration>) {
    eprintln!("\n🚀 MeshPilot MCP Server is running!");
    eprintln!("📋 Use Ctrl+C to stop the server");
    eprintln!("💡 For direct tool execution, use: meshpilot --tool <tool_name> --args '<json_args>'");
    eprintln!("📖 For help, use: meshpilot --help");
    eprintln!("📝 For tool list, use: meshpilot --list-tools\n");
    match demo_limit {
        Some(limit) => eprintln!(
            "🧪 Running in demo mode ({}s timeout). Set MESHPILOT_DEMO=false for production.",
            limit.as_secs()
        ),
        None => eprintln!("🚀 Running in production mode. Use Ctrl+C to stop."),
    }
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format. Output always
/// goes to stderr.
fn init_logging(logging: &LoggingConfig) {
    let level = match logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
