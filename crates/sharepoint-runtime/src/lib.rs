//! Tool dispatch and transports for the SharePoint MCP server.
//!
//! [`Toolbox`] maps tool names and JSON arguments onto
//! [`sharepoint_core::SharePointClient`] calls and renders every outcome as a
//! single text payload. [`McpService`] serves the toolbox over the Model
//! Context Protocol and [`transports::http`] exposes it as plain JSON routes.

pub mod service;
pub mod transports;

pub use service::toolbox::{JsonObject, Tool, ToolResponse, Toolbox};
pub use transports::{
    http::{router, router_with_mcp},
    mcp::{FILES_RESOURCE_URI, McpService, SERVER_NAME},
};
