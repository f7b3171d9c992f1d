//! `stdio` command: MCP over standard input/output.

use anyhow::{Context, Result};
use console::style;
use rmcp::{ServiceExt, transport::stdio};
use sharepoint_runtime::{McpService, Toolbox};
use tokio::signal;
use tracing::info;

/// Serves MCP on stdin/stdout until the client disconnects or Ctrl+C.
///
/// Status lines go to stderr; stdout carries protocol frames only.
pub async fn run(toolbox: Toolbox) -> Result<()> {
    eprintln!("{} Starting MCP stdio server...", style("→").cyan());
    eprintln!(
        "{} Site: {} ({} tools)",
        style("✓").green().bold(),
        toolbox.client().site_url(),
        toolbox.tools().len()
    );

    let running = McpService::new(toolbox)
        .serve(stdio())
        .await
        .context("failed to start MCP stdio server")?;

    let cancel = running.cancellation_token();
    let mut waiting = Box::pin(running.waiting());

    tokio::select! {
        result = &mut waiting => {
            result.context("MCP stdio server exited")?;
        }
        _ = signal::ctrl_c() => {
            cancel.cancel();
            let _ = waiting.await;
        }
    }

    info!("MCP stdio server stopped");
    Ok(())
}
