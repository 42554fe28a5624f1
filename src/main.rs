use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use oda_mcp::auth::run_auth;
use oda_mcp::browser_setup::launch_browser;
use oda_mcp::config::ServerConfig;
use oda_mcp::{GroceryServer, Session};

/// MCP server for the Oda online grocery store
#[derive(Debug, Parser)]
#[command(name = "oda-mcp", version, about)]
struct Cli {
    /// Data directory for the browser profile and saved cookies
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Run the interactive login flow instead of serving
    #[arg(long, conflicts_with = "clean")]
    auth: bool,

    /// Delete the data directory (browser profile, saved cookies) and exit
    #[arg(long)]
    clean: bool,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP protocol; all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::default();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    config.headless = !cli.headed;

    if cli.clean {
        return clean_data_dir(&config);
    }
    if cli.auth {
        return run_auth(config).await;
    }
    serve(config).await
}

fn clean_data_dir(config: &ServerConfig) -> Result<()> {
    let data_dir = &config.data_dir;
    if data_dir.exists() {
        std::fs::remove_dir_all(data_dir)
            .with_context(|| format!("Failed to remove {}", data_dir.display()))?;
        info!("Removed {}", data_dir.display());
    } else {
        info!("Nothing to clean at {}", data_dir.display());
    }
    Ok(())
}

async fn serve(config: ServerConfig) -> Result<()> {
    let browser = launch_browser(&config).await?;
    let session = Arc::new(Session::new(browser, config).await?);

    info!("Serving the grocery tools over stdio");
    // The session shuts down whether the transport ended cleanly or not,
    // so the browser never outlives a failed serve.
    let result = run_transport(&session).await;
    session.shutdown().await;
    result
}

async fn run_transport(session: &Arc<Session>) -> Result<()> {
    let service = GroceryServer::new(Arc::clone(session))
        .serve(stdio())
        .await
        .inspect_err(|error| tracing::error!("Failed to start the MCP service: {error}"))?;

    service.waiting().await?;

    info!("Client disconnected, shutting down");
    Ok(())
}
