//! Process configuration for the SharePoint client.
//!
//! Configuration comes from two places, applied in order:
//!
//! 1. An optional TOML file (`sharepoint.toml`) whose keys mirror the fields of
//!    [`Config`].
//! 2. Environment variables, which override anything read from the file.
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |---|---|
//! | `SHAREPOINT_SITE_URL` | `site_url` (required) |
//! | `AZURE_TENANT_ID` | `tenant_id` |
//! | `AZURE_CLIENT_ID` | `client_id` |
//! | `AZURE_CLIENT_SECRET` | `client_secret` |
//! | `SHAREPOINT_GRAPH_ENDPOINT` | `graph_endpoint` |
//! | `AZURE_AUTHORITY_HOST` | `authority_host` |
//! | `SHAREPOINT_ACCESS_TOKEN` | `access_token` |
//! | `SHAREPOINT_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` |
//!
//! Empty values are treated as unset. When tenant id, client id and client
//! secret are all present the client-credentials flow is used; otherwise the
//! ambient credential chain is used (see [`crate::credential`]).
//!
//! # Example
//!
//! ```no_run
//! use sharepoint_core::Config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! println!("serving {}", config.site_url);
//! # Ok(())
//! # }
//! ```

use std::{fmt, fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::credential::CredentialSource;

/// Default Microsoft Graph API endpoint.
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";

/// Default Microsoft identity platform authority.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

pub const ENV_SITE_URL: &str = "SHAREPOINT_SITE_URL";
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const ENV_GRAPH_ENDPOINT: &str = "SHAREPOINT_GRAPH_ENDPOINT";
pub const ENV_AUTHORITY_HOST: &str = "AZURE_AUTHORITY_HOST";
pub const ENV_ACCESS_TOKEN: &str = "SHAREPOINT_ACCESS_TOKEN";
pub const ENV_REQUEST_TIMEOUT: &str = "SHAREPOINT_REQUEST_TIMEOUT_SECS";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// I/O error when reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error when a config file is malformed.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required setting is absent.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A setting is present but unusable.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// SharePoint connection settings.
///
/// Immutable once handed to a [`crate::SharePointClient`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site URL in the form `https://<tenant>.sharepoint.com/sites/<path>`.
    pub site_url: String,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Override for the Graph base URL (used for sovereign clouds and tests).
    pub graph_endpoint: Option<String>,
    /// Override for the token authority host.
    pub authority_host: Option<String>,
    /// Static bearer token; bypasses credential acquisition entirely.
    pub access_token: Option<String>,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout_secs: Option<u64>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
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

impl Config {
    /// Creates a config for `site_url` with no explicit credentials.
    #[must_use]
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            ..Self::default()
        }
    }

    /// Sets the client-credentials triple.
    #[must_use]
    pub fn with_client_secret(
        mut self,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Overrides the Graph base URL.
    #[must_use]
    pub fn with_graph_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.graph_endpoint = Some(endpoint.into());
        self
    }

    /// Overrides the token authority host.
    #[must_use]
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = Some(host.into());
        self
    }

    /// Uses a fixed bearer token instead of acquiring one.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `SHAREPOINT_SITE_URL` is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the site URL is missing or a value cannot be
    /// parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_lookup(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file and then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or the
    /// merged result is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_lookup(path, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an explicit lookup for overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or the
    /// merged result is invalid.
    pub fn load_with_lookup<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let contents = fs::read_to_string(path.as_ref())?;
        let mut config: Self = toml::from_str(&contents)?;
        config.normalize();
        config.apply_lookup(lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_lookup<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(non_empty);

        if let Some(site_url) = get(ENV_SITE_URL) {
            self.site_url = site_url;
        }
        for (key, slot) in [
            (ENV_TENANT_ID, &mut self.tenant_id),
            (ENV_CLIENT_ID, &mut self.client_id),
            (ENV_CLIENT_SECRET, &mut self.client_secret),
            (ENV_GRAPH_ENDPOINT, &mut self.graph_endpoint),
            (ENV_AUTHORITY_HOST, &mut self.authority_host),
            (ENV_ACCESS_TOKEN, &mut self.access_token),
        ] {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT) {
            let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: ENV_REQUEST_TIMEOUT,
                reason: e.to_string(),
            })?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// Drops empty optional strings so that `key = ""` means unset.
    fn normalize(&mut self) {
        self.site_url = self.site_url.trim().to_string();
        for slot in [
            &mut self.tenant_id,
            &mut self.client_id,
            &mut self.client_secret,
            &mut self.graph_endpoint,
            &mut self.authority_host,
            &mut self.access_token,
        ] {
            *slot = slot.take().and_then(non_empty);
        }
    }

    /// Checks that the configuration is usable.
    ///
    /// Only presence is checked here; the `/sites/` shape of the URL is
    /// checked lazily by the resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if the site URL is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_url.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_SITE_URL));
        }
        Ok(())
    }

    /// Graph base URL without a trailing slash.
    pub fn graph_endpoint(&self) -> &str {
        self.graph_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_GRAPH_ENDPOINT)
            .trim_end_matches('/')
    }

    /// Token authority host without a trailing slash.
    pub fn authority_host(&self) -> &str {
        self.authority_host
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORITY_HOST)
            .trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Selects the credential variant for this configuration.
    ///
    /// A static access token wins, then the client-credentials triple; any
    /// other combination falls back to the ambient chain.
    pub fn credential_source(&self) -> CredentialSource {
        if let Some(token) = &self.access_token {
            return CredentialSource::Static {
                token: token.clone(),
            };
        }
        match (&self.tenant_id, &self.client_id, &self.client_secret) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                CredentialSource::ClientSecret {
                    tenant_id: tenant_id.clone(),
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                }
            }
            _ => CredentialSource::Ambient {
                client_id: self.client_id.clone(),
            },
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_all_fields() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_SITE_URL, "https://contoso.sharepoint.com/sites/eng"),
            (ENV_TENANT_ID, "tenant"),
            (ENV_CLIENT_ID, "client"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_REQUEST_TIMEOUT, "30"),
        ]))
        .unwrap();

        assert_eq!(config.site_url, "https://contoso.sharepoint.com/sites/eng");
        assert_eq!(config.tenant_id.as_deref(), Some("tenant"));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.graph_endpoint(), DEFAULT_GRAPH_ENDPOINT);
    }

    #[test]
    fn test_from_lookup_missing_site_url_fails() {
        let err = Config::from_lookup(lookup_from(&[(ENV_TENANT_ID, "tenant")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_SITE_URL)));
        assert_eq!(err.to_string(), "SHAREPOINT_SITE_URL is required");
    }

    #[test]
    fn test_from_lookup_treats_empty_values_as_unset() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_SITE_URL, "https://contoso.sharepoint.com/sites/eng"),
            (ENV_CLIENT_SECRET, "   "),
        ]))
        .unwrap();
        assert!(config.client_secret.is_none());
    }

    #[test]
    fn test_from_lookup_rejects_non_numeric_timeout() {
        let err = Config::from_lookup(lookup_from(&[
            (ENV_SITE_URL, "https://contoso.sharepoint.com/sites/eng"),
            (ENV_REQUEST_TIMEOUT, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_credential_source_selects_client_secret_when_complete() {
        let config = Config::new("https://contoso.sharepoint.com/sites/eng")
            .with_client_secret("t", "c", "s");
        assert!(matches!(
            config.credential_source(),
            CredentialSource::ClientSecret { .. }
        ));
    }

    #[test]
    fn test_credential_source_falls_back_to_ambient_when_partial() {
        let mut config = Config::new("https://contoso.sharepoint.com/sites/eng");
        config.client_id = Some("c".to_string());
        config.tenant_id = Some("t".to_string());

        match config.credential_source() {
            CredentialSource::Ambient { client_id } => assert_eq!(client_id.as_deref(), Some("c")),
            other => panic!("expected ambient source, got {other:?}"),
        }
    }

    #[test]
    fn test_credential_source_prefers_static_token() {
        let config = Config::new("https://contoso.sharepoint.com/sites/eng")
            .with_client_secret("t", "c", "s")
            .with_access_token("tok");
        assert!(matches!(
            config.credential_source(),
            CredentialSource::Static { .. }
        ));
    }

    #[test]
    fn test_endpoints_trim_trailing_slash() {
        let config = Config::new("https://contoso.sharepoint.com/sites/eng")
            .with_graph_endpoint("http://127.0.0.1:9000/v1.0/")
            .with_authority_host("http://127.0.0.1:9001/");
        assert_eq!(config.graph_endpoint(), "http://127.0.0.1:9000/v1.0");
        assert_eq!(config.authority_host(), "http://127.0.0.1:9001");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::new("https://contoso.sharepoint.com/sites/eng")
            .with_client_secret("t", "c", "super-secret")
            .with_access_token("tok-123");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("tok-123"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_load_reads_toml_and_env_overrides_it() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sharepoint.toml");
        fs::write(
            &path,
            r#"site_url = "https://contoso.sharepoint.com/sites/file"
tenant_id = "file-tenant"
client_secret = ""
"#,
        )
        .unwrap();

        let config = Config::load_with_lookup(
            &path,
            lookup_from(&[(ENV_SITE_URL, "https://contoso.sharepoint.com/sites/env")]),
        )
        .unwrap();

        assert_eq!(config.site_url, "https://contoso.sharepoint.com/sites/env");
        assert_eq!(config.tenant_id.as_deref(), Some("file-tenant"));
        assert!(config.client_secret.is_none());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = Config::load_with_lookup(temp.path().join("nope.toml"), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sharepoint.toml");
        fs::write(&path, "site_url = [").unwrap();
        let err = Config::load_with_lookup(&path, |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
