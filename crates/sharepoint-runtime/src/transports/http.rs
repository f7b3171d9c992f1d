//! Plain HTTP wrapper around the toolbox.
//!
//! | Route | Behaviour |
//! |---|---|
//! | `GET /` | service banner |
//! | `GET /health` | liveness probe |
//! | `GET /tools` | tool names |
//! | `POST /execute` | `{"tool_name", "params"?}` → tool result envelope |
//! | `GET /site-info` | `get_site_info` |
//! | `GET /files?folder_path=` | `list_files` |
//! | `/mcp` | MCP streamable HTTP (see [`router_with_mcp`]) |

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    service::toolbox::{JsonObject, Tool, Toolbox, ToolResponse},
    transports::mcp::McpService,
};

/// Banner reported by `GET /`.
pub const SERVICE_TITLE: &str = "Azure SharePoint MCP Server";

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    tool_name: String,
    #[serde(default)]
    params: Option<JsonObject>,
}

#[derive(Debug, Deserialize)]
struct FilesQuery {
    folder_path: Option<String>,
}

/// Builds the HTTP routes without the MCP endpoint.
pub fn router(toolbox: Toolbox) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/tools", get(tools))
        .route("/execute", post(execute))
        .route("/site-info", get(site_info))
        .route("/files", get(files))
        .with_state(toolbox)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Builds the HTTP routes with the MCP streamable HTTP service at `/mcp`.
pub fn router_with_mcp(toolbox: Toolbox) -> Router {
    let mcp = McpService::new(toolbox.clone()).streamable_http_service();
    router(toolbox).nest_service("/mcp", mcp)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": SERVICE_TITLE,
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "sharepoint-mcp" }))
}

async fn tools(State(toolbox): State<Toolbox>) -> Json<Value> {
    Json(json!({ "tools": toolbox.tool_names() }))
}

async fn execute(
    State(toolbox): State<Toolbox>,
    Json(request): Json<ExecuteRequest>,
) -> Json<Value> {
    let response = toolbox.call(&request.tool_name, request.params).await;
    envelope(response)
}

async fn site_info(State(toolbox): State<Toolbox>) -> Json<Value> {
    envelope(toolbox.call(Tool::GetSiteInfo.name(), None).await)
}

async fn files(State(toolbox): State<Toolbox>, Query(query): Query<FilesQuery>) -> Json<Value> {
    let arguments = query.folder_path.map(|folder_path| {
        let mut arguments = JsonObject::new();
        arguments.insert("folder_path".to_string(), Value::String(folder_path));
        arguments
    });
    envelope(toolbox.call(Tool::ListFiles.name(), arguments).await)
}

/// Wraps a tool response the way MCP text content is shaped.
fn envelope(response: ToolResponse) -> Json<Value> {
    Json(json!({
        "success": true,
        "result": [{ "type": "text", "text": response.text }],
    }))
}
