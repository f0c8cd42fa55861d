// Standalone MCP server binary

use anyhow::Result;
use clap::Parser;
use ghbridge_core::GhCli;
use ghbridge_mcp::config::ServerConfig;
use ghbridge_mcp::server::McpServer;
use ghbridge_mcp::tools::{register_github_tools, ToolRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ghbridge-mcp")]
#[command(about = "MCP server exposing GitHub operations through the gh CLI", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ghbridge.toml")]
    config: PathBuf,

    /// Path to the gh executable (overrides the configuration file)
    #[arg(long)]
    gh_path: Option<PathBuf>,

    /// Per-command timeout in seconds (overrides the configuration file)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("ghbridge MCP server starting...");

    let mut gateway_config = ServerConfig::load(&args.config)?.gateway_config();
    if let Some(gh_path) = args.gh_path {
        gateway_config = gateway_config.with_gh_path(gh_path);
    }
    if let Some(secs) = args.timeout_secs {
        gateway_config = gateway_config.with_timeout(Duration::from_secs(secs));
    }
    tracing::info!(
        "Using {} (timeout {:?})",
        gateway_config.gh_path.display(),
        gateway_config.timeout
    );

    let gateway = Arc::new(GhCli::from_config(&gateway_config));

    let mut registry = ToolRegistry::new();
    register_github_tools(&mut registry, gateway)?;

    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry);
    server.start().await?;

    Ok(())
}
