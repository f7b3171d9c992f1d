//! File operations on the site's default document library.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::{
    config::Config,
    credential::{AzureCredential, TokenProvider},
    error::{Error, Result},
    graph::GraphClient,
    path::{self, Suffix},
    resolver::Resolver,
    text::TextEncoding,
    types::{CreateFolderRequest, Descriptor, DriveItem, GraphList, SiteInfo},
};

const CONFLICT_BEHAVIOR: &str = "@microsoft.graph.conflictBehavior";

/// SharePoint file operations over Microsoft Graph.
///
/// Cheap to clone; clones share the HTTP connection pool and the resolved
/// site and drive identifiers.
///
/// # Example
///
/// ```no_run
/// use sharepoint_core::{Config, SharePointClient};
///
/// # async fn example() -> sharepoint_core::Result<()> {
/// let client = SharePointClient::new(Config::from_env()?)?;
/// for item in client.list_files("/Shared Documents").await? {
///     println!("{} {}", item.name, item.path);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SharePointClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: Config,
    graph: GraphClient,
    resolver: Resolver,
}

/// Builder for [`SharePointClient`] that allows replacing the HTTP client
/// or the token provider.
pub struct SharePointClientBuilder {
    config: Config,
    http: Option<reqwest::Client>,
    credential: Option<Arc<dyn TokenProvider>>,
}

impl SharePointClientBuilder {
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    #[must_use]
    pub fn token_provider(mut self, credential: Arc<dyn TokenProvider>) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Builds the client. No network I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid or the HTTP
    /// client cannot be constructed.
    pub fn build(self) -> Result<SharePointClient> {
        self.config.validate()?;
        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.config.request_timeout() {
                    builder = builder.timeout(timeout);
                }
                builder
                    .build()
                    .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?
            }
        };
        let credential = self.credential.unwrap_or_else(|| {
            Arc::new(AzureCredential::from_config(&self.config, http.clone()))
        });
        let graph = GraphClient::new(http, self.config.graph_endpoint(), credential)?;
        let resolver = Resolver::new(graph.clone(), self.config.site_url.clone());

        Ok(SharePointClient {
            inner: Arc::new(Inner {
                config: self.config,
                graph,
                resolver,
            }),
        })
    }
}

impl SharePointClient {
    /// Creates a client using the credential selected by `config`.
    ///
    /// # Errors
    ///
    /// See [`SharePointClientBuilder::build`].
    pub fn new(config: Config) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: Config) -> SharePointClientBuilder {
        SharePointClientBuilder {
            config,
            http: None,
            credential: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn site_url(&self) -> &str {
        self.inner.resolver.site_url()
    }

    async fn drive_path(&self, address: &str) -> Result<String> {
        let drive_id = self.inner.resolver.default_drive_id().await?;
        Ok(format!("drives/{drive_id}/{address}"))
    }

    /// Lists the children of `folder_path` in the order Graph returns them.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Operation`] prefixed with `Failed to list files`.
    pub async fn list_files(&self, folder_path: &str) -> Result<Vec<Descriptor>> {
        debug!(folder_path, "listing files");
        self.list_files_inner(folder_path)
            .await
            .map_err(|e| e.wrap("Failed to list files"))
    }

    async fn list_files_inner(&self, folder_path: &str) -> Result<Vec<Descriptor>> {
        let url = self
            .drive_path(&path::item_address(folder_path, Suffix::Children))
            .await?;
        let children: GraphList<DriveItem> = self.inner.graph.get_json(&url).await?;
        Ok(children
            .value
            .into_iter()
            .map(|item| {
                let item_path = path::child_path(folder_path, &item.name);
                Descriptor::from_item(item, item_path)
            })
            .collect())
    }

    /// Downloads the raw content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for the root path, otherwise an
    /// [`Error::Operation`] prefixed with `Failed to read file '<path>'`.
    pub async fn read_file(&self, file_path: &str) -> Result<Bytes> {
        debug!(file_path, "reading file");
        self.read_file_inner(file_path)
            .await
            .map_err(|e| e.wrap(&format!("Failed to read file '{file_path}'")))
    }

    async fn read_file_inner(&self, file_path: &str) -> Result<Bytes> {
        let address = path::content_address(file_path)?;
        let url = self.drive_path(&address).await?;
        self.inner.graph.get_bytes(&url).await
    }

    /// Downloads a file and decodes it as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] carrying the downloaded bytes if they are
    /// not valid in `encoding`, or any error from [`SharePointClient::read_file`].
    pub async fn read_file_text(&self, file_path: &str, encoding: TextEncoding) -> Result<String> {
        let content = self.read_file(file_path).await?;
        encoding.decode(content)
    }

    /// Uploads `content` to `file_path`.
    ///
    /// With `overwrite` false an existing file makes the upload fail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for the root path, otherwise an
    /// [`Error::Operation`] prefixed with `Failed to write file '<path>'`.
    pub async fn write_file(
        &self,
        file_path: &str,
        content: impl Into<Bytes>,
        overwrite: bool,
    ) -> Result<Descriptor> {
        let content = content.into();
        debug!(file_path, bytes = content.len(), overwrite, "writing file");
        self.write_file_inner(file_path, content, overwrite)
            .await
            .map_err(|e| e.wrap(&format!("Failed to write file '{file_path}'")))
    }

    async fn write_file_inner(
        &self,
        file_path: &str,
        content: Bytes,
        overwrite: bool,
    ) -> Result<Descriptor> {
        let address = path::content_address(file_path)?;
        let url = self.drive_path(&address).await?;
        let behavior = if overwrite { "replace" } else { "fail" };
        let item: DriveItem = self
            .inner
            .graph
            .put_bytes(&url, &[(CONFLICT_BEHAVIOR, behavior)], content)
            .await?;
        Ok(Descriptor::from_item(item, path::virtual_path(file_path)))
    }

    /// Deletes a file (or folder).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for the root path, otherwise an
    /// [`Error::Operation`] prefixed with `Failed to delete file '<path>'`.
    /// Missing items are reported like any other failure.
    pub async fn delete_file(&self, file_path: &str) -> Result<bool> {
        debug!(file_path, "deleting file");
        self.delete_file_inner(file_path)
            .await
            .map_err(|e| e.wrap(&format!("Failed to delete file '{file_path}'")))?;
        Ok(true)
    }

    async fn delete_file_inner(&self, file_path: &str) -> Result<()> {
        if path::is_root(file_path) {
            return Err(Error::Validation("the drive root cannot be deleted".to_string()));
        }
        let url = self
            .drive_path(&path::item_address(file_path, Suffix::Item))
            .await?;
        self.inner.graph.delete(&url).await
    }

    /// Creates the folder named by the last segment of `folder_path` inside
    /// its parent. Fails if the folder already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the path has no leaf, otherwise an
    /// [`Error::Operation`] prefixed with `Failed to create folder '<path>'`.
    pub async fn create_folder(&self, folder_path: &str) -> Result<Descriptor> {
        debug!(folder_path, "creating folder");
        self.create_folder_inner(folder_path)
            .await
            .map_err(|e| e.wrap(&format!("Failed to create folder '{folder_path}'")))
    }

    async fn create_folder_inner(&self, folder_path: &str) -> Result<Descriptor> {
        let (parent, leaf) = path::split_parent(folder_path);
        if leaf.is_empty() {
            return Err(Error::Validation("folder_path must name a folder".to_string()));
        }
        let url = self
            .drive_path(&path::item_address(&parent, Suffix::Children))
            .await?;
        let body = CreateFolderRequest {
            name: &leaf,
            folder: serde_json::Map::new(),
            conflict_behavior: "fail",
        };
        let mut item: DriveItem = self.inner.graph.post_json(&url, &body).await?;
        if item.folder.is_none() {
            item.folder = Some(serde_json::Value::Object(serde_json::Map::new()));
        }
        Ok(Descriptor::from_item(item, path::virtual_path(folder_path)))
    }

    /// Returns `true` if an item exists at `file_path`.
    ///
    /// Every failure, including network errors, yields `false`.
    pub async fn file_exists(&self, file_path: &str) -> bool {
        match self.file_exists_inner(file_path).await {
            Ok(()) => true,
            Err(e) => {
                debug!(file_path, error = %e, "existence check failed");
                false
            }
        }
    }

    async fn file_exists_inner(&self, file_path: &str) -> Result<()> {
        let url = self
            .drive_path(&path::item_address(file_path, Suffix::Item))
            .await?;
        self.inner.graph.probe(&url).await
    }

    /// Fetches metadata for the configured site.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Operation`] prefixed with `Failed to get site info`.
    pub async fn site_info(&self) -> Result<SiteInfo> {
        self.site_info_inner()
            .await
            .map_err(|e| e.wrap("Failed to get site info"))
    }

    async fn site_info_inner(&self) -> Result<SiteInfo> {
        let site_id = self.inner.resolver.site_id().await?;
        self.inner.graph.get_json(&format!("sites/{site_id}")).await
    }

    /// Returns `true` if the site metadata can be fetched.
    pub async fn test_connection(&self) -> bool {
        match self.site_info().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "connection test failed");
                false
            }
        }
    }
}
