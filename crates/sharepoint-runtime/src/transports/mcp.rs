//! Model Context Protocol (MCP) transport.
//!
//! [`McpService`] implements `rmcp::ServerHandler` on top of a [`Toolbox`].
//! It exposes the SharePoint tools plus one resource, `sharepoint://files`,
//! which lists the root of the document library.
//!
//! The same handler serves stdio (via `rmcp::transport::stdio`) and
//! streamable HTTP (via [`McpService::streamable_http_service`]).

use std::{borrow::Cow, sync::Arc};

use rmcp::{
    ErrorData, RoleServer,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, Content, Implementation,
        ListResourcesResult, ListToolsResult, PaginatedRequestParam, RawResource,
        ReadResourceRequestParam, ReadResourceResult, Resource, ResourceContents,
        ServerCapabilities, ServerInfo, Tool as McpTool, ToolAnnotations,
    },
    service::RequestContext,
    transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    },
};
use serde_json::json;
use tracing::error;

use crate::service::toolbox::{Tool, Toolbox};

/// Server name announced during initialization.
pub const SERVER_NAME: &str = "azure-sharepoint-mcp-server";

/// URI of the resource that lists the library root.
pub const FILES_RESOURCE_URI: &str = "sharepoint://files";

/// MCP server over a [`Toolbox`].
///
/// # Example
///
/// ```no_run
/// use sharepoint_core::{Config, SharePointClient};
/// use sharepoint_runtime::{McpService, Toolbox};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SharePointClient::new(Config::from_env()?)?;
/// let service = McpService::new(Toolbox::new(client));
/// let router: axum::Router = axum::Router::new().nest_service("/mcp", service.streamable_http_service());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct McpService {
    toolbox: Toolbox,
    info: ServerInfo,
}

impl McpService {
    /// Create a new MCP service with the default server info.
    #[must_use]
    pub fn new(toolbox: Toolbox) -> Self {
        Self::with_info(toolbox, default_server_info())
    }

    /// Create a new MCP service with custom server info.
    #[must_use]
    pub fn with_info(toolbox: Toolbox, info: ServerInfo) -> Self {
        Self { toolbox, info }
    }

    #[must_use]
    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    #[must_use]
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Creates a streamable HTTP service with default configuration.
    #[must_use]
    pub fn streamable_http_service(&self) -> StreamableHttpService<Self, LocalSessionManager> {
        self.streamable_http_service_with_config(StreamableHttpServerConfig::default())
    }

    /// Creates a streamable HTTP service with custom configuration.
    #[must_use]
    pub fn streamable_http_service_with_config(
        &self,
        config: StreamableHttpServerConfig,
    ) -> StreamableHttpService<Self, LocalSessionManager> {
        let service = self.clone();
        StreamableHttpService::new(move || Ok(service.clone()), Arc::default(), config)
    }

    /// Renders the text of a resource. Failures are rendered as
    /// `{"error": ...}` like tool failures.
    async fn resource_text(&self, uri: &str) -> String {
        if uri != FILES_RESOURCE_URI {
            return json!({ "error": format!("Unknown resource: {uri}") }).to_string();
        }
        let listing = self
            .toolbox
            .client()
            .list_files("/")
            .await
            .and_then(|files| Ok(serde_json::to_string_pretty(&files)?));
        match listing {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to read files resource");
                json!({ "error": e.to_string() }).to_string()
            }
        }
    }
}

impl ServerHandler for McpService {
    fn get_info(&self) -> ServerInfo {
        self.info.clone()
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        let tools = self.toolbox.tools().iter().copied().map(tool_to_mcp).collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    /// Forwards to the toolbox. Tool failures are reported as text content,
    /// never as protocol errors.
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let response = self.toolbox.call(&request.name, request.arguments).await;
            Ok(CallToolResult::success(vec![Content::text(response.text)]))
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListResourcesResult::with_all_items(vec![
            files_resource(),
        ])))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, ErrorData>> + Send + '_ {
        async move {
            let text = self.resource_text(&request.uri).await;
            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(text, request.uri)],
            })
        }
    }
}

/// Creates the default server info with tools and resources enabled.
fn default_server_info() -> ServerInfo {
    ServerInfo {
        capabilities: ServerCapabilities::builder()
            .enable_tools()
            .enable_resources()
            .build(),
        server_info: Implementation {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Implementation::default()
        },
        instructions: Some(
            "Read and manage files in the configured SharePoint document library.".to_string(),
        ),
        ..Default::default()
    }
}

fn files_resource() -> Resource {
    let mut resource = RawResource::new(FILES_RESOURCE_URI, "SharePoint Files");
    resource.description = Some("Access to SharePoint files and folders".to_string());
    resource.mime_type = Some("application/json".to_string());
    resource.no_annotation()
}

fn tool_to_mcp(tool: Tool) -> McpTool {
    McpTool {
        name: Cow::Borrowed(tool.name()),
        title: Some(tool.title().to_string()),
        description: Some(Cow::Borrowed(tool.description())),
        input_schema: Arc::new(tool.input_schema()),
        output_schema: None,
        annotations: Some(
            ToolAnnotations::new()
                .read_only(tool.is_read_only())
                .destructive(tool == Tool::DeleteFile),
        ),
        icons: None,
    }
}
