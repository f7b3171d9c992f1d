//! SharePoint document library access over the Model Context Protocol.
//!
//! Usage:
//! ```bash
//! sharepoint-mcp                                   # MCP over stdio
//! sharepoint-mcp serve --addr 0.0.0.0:8000         # HTTP routes + /mcp
//! sharepoint-mcp call list_files '{"folder_path":"/"}'
//! sharepoint-mcp call write_file @request.json
//! sharepoint-mcp tools                             # Show the tool table
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Debug, Parser)]
#[command(name = "sharepoint-mcp", author, version, about)]
struct Cli {
    /// TOML file with connection settings; environment variables override it
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log output format (logs always go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(flatten)]
    connection: config::ConnectionArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Default, Subcommand)]
enum Command {
    /// Serve MCP over stdin/stdout (default)
    #[default]
    Stdio,

    /// Serve the HTTP routes and the streamable MCP endpoint
    Serve(commands::serve::ServeArgs),

    /// Run a single tool and print its payload
    Call(commands::call::CallArgs),

    /// List the available tools
    Tools(commands::tools::ToolsArgs),
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new("info").context("failed to parse log directive")?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let command = cli.command.unwrap_or_default();
    if let Command::Tools(args) = &command {
        return commands::tools::run(args);
    }

    let toolbox = config::toolbox(&cli.connection, cli.config.as_deref())?;
    match &command {
        Command::Stdio => commands::stdio::run(toolbox).await,
        Command::Serve(args) => commands::serve::run(args, toolbox).await,
        Command::Call(args) => commands::call::run(args, &toolbox).await,
        Command::Tools(args) => commands::tools::run(args),
    }
}
