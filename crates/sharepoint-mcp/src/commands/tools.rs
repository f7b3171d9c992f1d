//! `sharepoint-mcp tools` command implementation.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde_json::{Value, json};
use sharepoint_runtime::Tool;

/// Arguments for the `tools` command.
#[derive(Debug, Args)]
pub struct ToolsArgs {
    /// Print the table as JSON, including input schemas.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &ToolsArgs) -> Result<()> {
    if args.json {
        let table = serde_json::to_string_pretty(&tool_table())
            .context("failed to serialize tool table")?;
        println!("{table}");
        return Ok(());
    }

    println!("{} {} tool(s)", style("✓").green().bold(), Tool::ALL.len());
    for tool in Tool::ALL {
        let access = if tool.is_read_only() { "read" } else { "write" };
        println!(
            "  {} {} {}",
            style(tool.name()).cyan().bold(),
            style(format!("[{access}]")).dim(),
            tool.description()
        );
    }
    Ok(())
}

fn tool_table() -> Vec<Value> {
    Tool::ALL
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name(),
                "title": tool.title(),
                "description": tool.description(),
                "readOnly": tool.is_read_only(),
                "inputSchema": tool.input_schema(),
            })
        })
        .collect()
}
