//! `sharepoint-mcp serve` command implementation.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use sharepoint_runtime::{Toolbox, router_with_mcp};
use tokio::{net::TcpListener, signal};
use tracing::info;

/// Arguments for the `serve` command.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8000")]
    pub addr: SocketAddr,
}

pub async fn run(args: &ServeArgs, toolbox: Toolbox) -> Result<()> {
    let shutdown = async {
        let _ = signal::ctrl_c().await;
        info!("Received shutdown signal");
    };
    run_with_shutdown(args, toolbox, shutdown).await
}

async fn run_with_shutdown<F>(args: &ServeArgs, toolbox: Toolbox, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    eprintln!("{} Starting SharePoint HTTP server...", style("→").cyan());

    let listener = TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;
    let addr = listener
        .local_addr()
        .context("failed to read listener address")?;

    info!(address = %addr, site_url = %toolbox.client().site_url(), "Starting HTTP server");
    eprintln!(
        "{} Server running on http://{addr} (MCP at /mcp)",
        style("✓").green().bold()
    );
    eprintln!("Press Ctrl+C to stop\n");

    axum::serve(listener, router_with_mcp(toolbox))
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    info!("SharePoint HTTP server stopped");
    Ok(())
}
