//! CLI command implementations for `sharepoint-mcp`.
//!
//! - **`stdio`**: Serve MCP over stdin/stdout for desktop clients
//! - **`serve`**: Host the HTTP routes and the streamable MCP endpoint
//! - **`call`**: Run one tool locally with JSON input
//! - **`tools`**: Print the tool table
//!
//! Each module exposes a `run` function; commands that take flags also
//! export an `*Args` struct implementing `clap::Args`.

pub mod call;
pub mod serve;
pub mod stdio;
pub mod tools;
