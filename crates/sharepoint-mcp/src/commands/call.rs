//! `sharepoint-mcp call` command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::Value;
use sharepoint_runtime::{JsonObject, Tool, Toolbox};

/// Arguments for the `call` command.
#[derive(Debug, Args)]
pub struct CallArgs {
    /// Tool name, e.g. `list_files`.
    pub tool: String,

    /// JSON object of arguments, inline or as `@path/to/args.json`.
    pub input: Option<String>,
}

/// Runs one tool and prints its text payload to stdout.
///
/// The payload is printed even when the tool reports an error; the command
/// then fails so the exit status reflects it.
pub async fn run(args: &CallArgs, toolbox: &Toolbox) -> Result<()> {
    if Tool::from_name(&args.tool).is_none() {
        bail!(
            "unknown tool '{}' (available: {})",
            args.tool,
            toolbox.tool_names().join(", ")
        );
    }
    let arguments = parse_input(args.input.as_deref())?;
    let response = toolbox.call(&args.tool, arguments).await;
    println!("{}", response.text);
    if response.is_error {
        bail!("tool '{}' returned an error", args.tool);
    }
    Ok(())
}

fn parse_input(input: Option<&str>) -> Result<Option<JsonObject>> {
    let Some(raw) = input else {
        return Ok(None);
    };
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file: {path}"))?,
        None => raw.to_string(),
    };
    match serde_json::from_str(&text).context("failed to parse input JSON")? {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        other => bail!("tool arguments must be a JSON object, got: {other}"),
    }
}
