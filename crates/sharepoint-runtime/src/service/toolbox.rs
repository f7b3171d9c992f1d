use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use sharepoint_core::{Error, Result, SharePointClient, TextEncoding, text::binary_preview};
use tracing::{error, info, instrument};

/// JSON object used for tool arguments and schemas.
pub type JsonObject = Map<String, Value>;

/// The tools exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    ListFiles,
    ReadFile,
    WriteFile,
    DeleteFile,
    CreateFolder,
    FileExists,
    TestConnection,
    GetSiteInfo,
}

impl Tool {
    pub const ALL: [Self; 8] = [
        Self::ListFiles,
        Self::ReadFile,
        Self::WriteFile,
        Self::DeleteFile,
        Self::CreateFolder,
        Self::FileExists,
        Self::TestConnection,
        Self::GetSiteInfo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ListFiles => "list_files",
            Self::ReadFile => "read_file",
            Self::WriteFile => "write_file",
            Self::DeleteFile => "delete_file",
            Self::CreateFolder => "create_folder",
            Self::FileExists => "file_exists",
            Self::TestConnection => "test_connection",
            Self::GetSiteInfo => "get_site_info",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::ListFiles => "List files",
            Self::ReadFile => "Read file",
            Self::WriteFile => "Write file",
            Self::DeleteFile => "Delete file",
            Self::CreateFolder => "Create folder",
            Self::FileExists => "File exists",
            Self::TestConnection => "Test connection",
            Self::GetSiteInfo => "Get site info",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ListFiles => "List files and folders in SharePoint",
            Self::ReadFile => "Read a file from SharePoint",
            Self::WriteFile => "Write a file to SharePoint",
            Self::DeleteFile => "Delete a file from SharePoint",
            Self::CreateFolder => "Create a folder in SharePoint",
            Self::FileExists => "Check if a file exists in SharePoint",
            Self::TestConnection => "Test SharePoint connection",
            Self::GetSiteInfo => "Get SharePoint site information",
        }
    }

    /// JSON schema of the tool's arguments.
    pub fn input_schema(self) -> JsonObject {
        match self {
            Self::ListFiles => schema_for::<ListFilesArgs>(),
            Self::ReadFile => schema_for::<ReadFileArgs>(),
            Self::WriteFile => schema_for::<WriteFileArgs>(),
            Self::DeleteFile | Self::FileExists => schema_for::<FilePathArgs>(),
            Self::CreateFolder => schema_for::<CreateFolderArgs>(),
            Self::TestConnection | Self::GetSiteInfo => schema_for::<NoArgs>(),
        }
    }

    /// Whether the tool only reads state.
    pub fn is_read_only(self) -> bool {
        !matches!(self, Self::WriteFile | Self::DeleteFile | Self::CreateFolder)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn schema_for<T: JsonSchema>() -> JsonObject {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(&schema) {
        Ok(Value::Object(mut map)) => {
            map.remove("$schema");
            map
        }
        _ => JsonObject::default(),
    }
}

fn default_folder_path() -> String {
    "/".to_string()
}

fn default_encoding() -> String {
    TextEncoding::Utf8.name().to_string()
}

fn default_overwrite() -> bool {
    true
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListFilesArgs {
    /// SharePoint folder path (default: /)
    #[serde(default = "default_folder_path")]
    folder_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ReadFileArgs {
    /// SharePoint file path
    file_path: String,
    /// Text encoding (default: utf-8)
    #[serde(default = "default_encoding")]
    encoding: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct WriteFileArgs {
    /// SharePoint file path
    file_path: String,
    /// File content
    content: String,
    /// Whether to overwrite existing file
    #[serde(default = "default_overwrite")]
    overwrite: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FilePathArgs {
    /// SharePoint file path
    file_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateFolderArgs {
    /// SharePoint folder path
    folder_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct NoArgs {}

/// Text payload produced by a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    pub text: String,
    /// `true` when `text` is an `{"error": ...}` payload.
    pub is_error: bool,
}

impl ToolResponse {
    fn ok(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    fn error(message: &str) -> Self {
        Self {
            text: json!({ "error": message }).to_string(),
            is_error: true,
        }
    }
}

/// Dispatches tool calls by name onto a [`SharePointClient`].
///
/// Every outcome, including unknown tools, bad arguments and upstream
/// failures, is rendered as a [`ToolResponse`]; nothing is propagated.
#[derive(Debug, Clone)]
pub struct Toolbox {
    client: SharePointClient,
}

impl Toolbox {
    #[must_use]
    pub fn new(client: SharePointClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SharePointClient {
        &self.client
    }

    pub fn tools(&self) -> &'static [Tool] {
        &Tool::ALL
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        Tool::ALL.iter().map(|tool| tool.name()).collect()
    }

    #[instrument(skip(self, arguments))]
    pub async fn call(&self, name: &str, arguments: Option<JsonObject>) -> ToolResponse {
        let Some(tool) = Tool::from_name(name) else {
            info!("Unknown tool requested");
            return ToolResponse::ok(format!("Unknown tool: {name}"));
        };

        info!("Invoking tool");
        let arguments = Value::Object(arguments.unwrap_or_default());
        match self.dispatch(tool, arguments).await {
            Ok(text) => ToolResponse::ok(text),
            Err(e) => {
                error!(error = %e, "Tool failed");
                ToolResponse::error(&e.to_string())
            }
        }
    }

    async fn dispatch(&self, tool: Tool, arguments: Value) -> Result<String> {
        match tool {
            Tool::ListFiles => {
                let args: ListFilesArgs = parse_args(arguments)?;
                let files = self.client.list_files(&args.folder_path).await?;
                pretty(&files)
            }
            Tool::ReadFile => {
                let args: ReadFileArgs = parse_args(arguments)?;
                let encoding: TextEncoding = args.encoding.parse()?;
                match self.client.read_file_text(&args.file_path, encoding).await {
                    Ok(text) => Ok(text),
                    Err(Error::Decode { content, .. }) => Ok(binary_preview(&content)),
                    Err(e) => Err(e),
                }
            }
            Tool::WriteFile => {
                let args: WriteFileArgs = parse_args(arguments)?;
                let descriptor = self
                    .client
                    .write_file(&args.file_path, args.content, args.overwrite)
                    .await?;
                pretty(&descriptor)
            }
            Tool::DeleteFile => {
                let args: FilePathArgs = parse_args(arguments)?;
                let success = self.client.delete_file(&args.file_path).await?;
                Ok(json!({
                    "success": success,
                    "message": format!("File '{}' deleted", args.file_path),
                })
                .to_string())
            }
            Tool::CreateFolder => {
                let args: CreateFolderArgs = parse_args(arguments)?;
                let descriptor = self.client.create_folder(&args.folder_path).await?;
                pretty(&descriptor)
            }
            Tool::FileExists => {
                let args: FilePathArgs = parse_args(arguments)?;
                let exists = self.client.file_exists(&args.file_path).await;
                Ok(json!({ "exists": exists, "file_path": args.file_path }).to_string())
            }
            Tool::TestConnection => {
                let _: NoArgs = parse_args(arguments)?;
                let connected = self.client.test_connection().await;
                let message = if connected {
                    "Connection successful"
                } else {
                    "Connection failed"
                };
                Ok(json!({
                    "connected": connected,
                    "site_url": self.client.site_url(),
                    "message": message,
                })
                .to_string())
            }
            Tool::GetSiteInfo => {
                let _: NoArgs = parse_args(arguments)?;
                let info = self.client.site_info().await?;
                pretty(&info)
            }
        }
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| Error::Validation(e.to_string()))
}

fn pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
