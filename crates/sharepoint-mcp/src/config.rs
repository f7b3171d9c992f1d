//! Connection settings from flags, environment and an optional TOML file.

use std::{fmt, path::Path};

use anyhow::{Context, Result};
use clap::Args;
use sharepoint_core::{
    Config, SharePointClient,
    config::{
        ENV_ACCESS_TOKEN, ENV_AUTHORITY_HOST, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_GRAPH_ENDPOINT,
        ENV_REQUEST_TIMEOUT, ENV_SITE_URL, ENV_TENANT_ID,
    },
};
use sharepoint_runtime::Toolbox;
use tracing::info;

/// Connection flags. Each one falls back to its environment variable.
#[derive(Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Site URL, e.g. https://contoso.sharepoint.com/sites/eng
    #[arg(long, global = true, env = ENV_SITE_URL)]
    pub site_url: Option<String>,

    #[arg(long, global = true, env = ENV_TENANT_ID)]
    pub tenant_id: Option<String>,

    #[arg(long, global = true, env = ENV_CLIENT_ID)]
    pub client_id: Option<String>,

    #[arg(long, global = true, env = ENV_CLIENT_SECRET, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Graph base URL override
    #[arg(long, global = true, env = ENV_GRAPH_ENDPOINT)]
    pub graph_endpoint: Option<String>,

    /// Token authority override
    #[arg(long, global = true, env = ENV_AUTHORITY_HOST)]
    pub authority_host: Option<String>,

    /// Static bearer token; skips credential acquisition
    #[arg(long, global = true, env = ENV_ACCESS_TOKEN, hide_env_values = true)]
    pub access_token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = ENV_REQUEST_TIMEOUT, value_name = "SECS")]
    pub request_timeout_secs: Option<u64>,
}

impl fmt::Debug for ConnectionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionArgs")
            .field("site_url", &self.site_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("graph_endpoint", &self.graph_endpoint)
            .field("authority_host", &self.authority_host)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ConnectionArgs {
    /// Returns the value for an environment key as seen through the flags.
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            ENV_SITE_URL => self.site_url.clone(),
            ENV_TENANT_ID => self.tenant_id.clone(),
            ENV_CLIENT_ID => self.client_id.clone(),
            ENV_CLIENT_SECRET => self.client_secret.clone(),
            ENV_GRAPH_ENDPOINT => self.graph_endpoint.clone(),
            ENV_AUTHORITY_HOST => self.authority_host.clone(),
            ENV_ACCESS_TOKEN => self.access_token.clone(),
            ENV_REQUEST_TIMEOUT => self.request_timeout_secs.map(|secs| secs.to_string()),
            _ => None,
        }
    }
}

/// Resolves the effective configuration.
///
/// The TOML file, when given, is read first; flags and their environment
/// variables override it.
pub fn load(args: &ConnectionArgs, path: Option<&Path>) -> Result<Config> {
    let lookup = |key: &str| args.lookup(key);
    let config = match path {
        Some(path) => Config::load_with_lookup(path, lookup)
            .with_context(|| format!("failed to load config file: {}", path.display()))?,
        None => Config::from_lookup(lookup).context("failed to load configuration")?,
    };
    Ok(config)
}

/// Builds the tool dispatcher for the resolved configuration.
pub fn toolbox(args: &ConnectionArgs, path: Option<&Path>) -> Result<Toolbox> {
    let config = load(args, path)?;
    info!(
        site_url = %config.site_url,
        credential = config.credential_source().kind(),
        "configuration loaded"
    );
    let client = SharePointClient::new(config).context("failed to create SharePoint client")?;
    Ok(Toolbox::new(client))
}
