//! Transports that expose the [`Toolbox`](crate::Toolbox) to clients.
//!
//! - `mcp`: Model Context Protocol server, served over stdio or streamable
//!   HTTP
//! - `http`: plain JSON routes for simple integrations, optionally with the
//!   MCP endpoint mounted at `/mcp`

pub mod http;
pub mod mcp;
