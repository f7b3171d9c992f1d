//! Bearer token acquisition for Microsoft Graph.
//!
//! [`AzureCredential`] is built once per client from a [`CredentialSource`]
//! and asked for a fresh token on every request; tokens are never cached
//! here because they expire.
//!
//! The ambient chain tries, in order:
//!
//! 1. App Service managed identity (`IDENTITY_ENDPOINT` + `IDENTITY_HEADER`).
//! 2. The instance metadata service (IMDS) managed identity.
//! 3. A local Azure CLI login (`az account get-access-token`).

use std::{fmt, time::Duration};

use futures::future::BoxFuture;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::{
    config::Config,
    error::{Error, Result},
};

/// Audience for Microsoft Graph tokens.
pub const GRAPH_AUDIENCE: &str = "https://graph.microsoft.com";

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const IMDS_TIMEOUT: Duration = Duration::from_secs(2);

/// Future returned by [`TokenProvider::token`].
pub type TokenFuture<'a> = BoxFuture<'a, Result<String>>;

/// Supplies bearer tokens for a fixed audience.
///
/// # Example
///
/// ```
/// use sharepoint_core::credential::{TokenFuture, TokenProvider};
///
/// struct Fixed;
///
/// impl TokenProvider for Fixed {
///     fn token<'a>(&'a self, _audience: &'a str) -> TokenFuture<'a> {
///         Box::pin(async { Ok("token".to_string()) })
///     }
/// }
/// ```
pub trait TokenProvider: Send + Sync {
    /// Returns a bearer token valid for `audience`.
    fn token<'a>(&'a self, audience: &'a str) -> TokenFuture<'a>;
}

/// How tokens are obtained. Chosen once from configuration.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// OAuth2 client-credentials grant against the identity platform.
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// Managed identity, then developer login. `client_id` selects a
    /// user-assigned identity when present.
    Ambient { client_id: Option<String> },
    /// A fixed token supplied by the operator.
    Static { token: String },
}

impl CredentialSource {
    /// Short label safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClientSecret { .. } => "client_secret",
            Self::Ambient { .. } => "ambient",
            Self::Static { .. } => "static",
        }
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"***")
                .finish(),
            Self::Ambient { client_id } => f
                .debug_struct("Ambient")
                .field("client_id", client_id)
                .finish(),
            Self::Static { .. } => f.debug_struct("Static").field("token", &"***").finish(),
        }
    }
}

/// Endpoints probed by the ambient chain.
#[derive(Debug, Clone)]
struct AmbientEndpoints {
    app_service: Option<(String, String)>,
    imds: Option<String>,
    azure_cli: bool,
}

impl AmbientEndpoints {
    fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            app_service: var("IDENTITY_ENDPOINT").zip(var("IDENTITY_HEADER")),
            imds: Some(IMDS_ENDPOINT.to_string()),
            azure_cli: true,
        }
    }
}

/// Default [`TokenProvider`] backed by Azure identity endpoints.
#[derive(Clone)]
pub struct AzureCredential {
    source: CredentialSource,
    authority_host: String,
    http: reqwest::Client,
    ambient: AmbientEndpoints,
}

impl fmt::Debug for AzureCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredential")
            .field("source", &self.source)
            .field("authority_host", &self.authority_host)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(alias = "accessToken")]
    access_token: String,
}

impl AzureCredential {
    /// Creates a credential for `source`, probing the process environment
    /// for App Service identity settings.
    pub fn new(source: CredentialSource, authority_host: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            source,
            authority_host: authority_host.into().trim_end_matches('/').to_string(),
            http,
            ambient: AmbientEndpoints::from_env(),
        }
    }

    /// Creates the credential selected by `config`.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        Self::new(config.credential_source(), config.authority_host(), http)
    }

    /// Overrides the App Service identity endpoint and header.
    #[must_use]
    pub fn with_app_service(mut self, endpoint: impl Into<String>, header: impl Into<String>) -> Self {
        self.ambient.app_service = Some((endpoint.into(), header.into()));
        self
    }

    /// Overrides (or with `None`, disables) the IMDS endpoint.
    #[must_use]
    pub fn with_imds_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.ambient.imds = endpoint;
        self
    }

    /// Enables or disables the Azure CLI fallback.
    #[must_use]
    pub fn with_azure_cli(mut self, enabled: bool) -> Self {
        self.ambient.azure_cli = enabled;
        self
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    async fn client_secret(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
        audience: &str,
    ) -> Result<String> {
        let url = format!("{}/{tenant_id}/oauth2/v2.0/token", self.authority_host);
        let scope = format!("{}/.default", audience.trim_end_matches('/'));
        debug!(url = %url, "requesting client-credentials token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("scope", scope.as_str()),
        ];
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("token request failed: {e}")))?;
        parse_token_response(response).await
    }

    async fn ambient(&self, client_id: Option<&str>, audience: &str) -> Result<String> {
        let mut failures = Vec::new();

        if let Some((endpoint, header)) = &self.ambient.app_service {
            match self.app_service(endpoint, header, client_id, audience).await {
                Ok(token) => return Ok(token),
                Err(e) => failures.push(format!("app service identity: {e}")),
            }
        }
        if let Some(endpoint) = &self.ambient.imds {
            match self.imds(endpoint, client_id, audience).await {
                Ok(token) => return Ok(token),
                Err(e) => failures.push(format!("managed identity: {e}")),
            }
        }
        if self.ambient.azure_cli {
            match azure_cli(audience).await {
                Ok(token) => return Ok(token),
                Err(e) => failures.push(format!("azure cli: {e}")),
            }
        }

        if failures.is_empty() {
            failures.push("no credential sources enabled".to_string());
        }
        Err(Error::Auth(format!(
            "no usable ambient credential ({})",
            failures.join("; ")
        )))
    }

    async fn app_service(
        &self,
        endpoint: &str,
        header: &str,
        client_id: Option<&str>,
        audience: &str,
    ) -> Result<String> {
        debug!(endpoint, "requesting app service identity token");
        let mut query = vec![("resource", audience), ("api-version", APP_SERVICE_API_VERSION)];
        if let Some(client_id) = client_id {
            query.push(("client_id", client_id));
        }
        let response = self
            .http
            .get(endpoint)
            .query(&query)
            .header("X-IDENTITY-HEADER", header)
            .send()
            .await
            .map_err(|e| Error::Auth(e.to_string()))?;
        parse_token_response(response).await
    }

    async fn imds(&self, endpoint: &str, client_id: Option<&str>, audience: &str) -> Result<String> {
        debug!(endpoint, "requesting instance metadata identity token");
        let mut query = vec![("api-version", IMDS_API_VERSION), ("resource", audience)];
        if let Some(client_id) = client_id {
            query.push(("client_id", client_id));
        }
        let response = self
            .http
            .get(endpoint)
            .query(&query)
            .header("Metadata", "true")
            .timeout(IMDS_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Auth(e.to_string()))?;
        parse_token_response(response).await
    }
}

impl TokenProvider for AzureCredential {
    fn token<'a>(&'a self, audience: &'a str) -> TokenFuture<'a> {
        Box::pin(async move {
            match &self.source {
                CredentialSource::Static { token } => Ok(token.clone()),
                CredentialSource::ClientSecret {
                    tenant_id,
                    client_id,
                    client_secret,
                } => {
                    self.client_secret(tenant_id, client_id, client_secret, audience)
                        .await
                }
                CredentialSource::Ambient { client_id } => {
                    self.ambient(client_id.as_deref(), audience).await
                }
            }
        })
    }
}

async fn parse_token_response(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Auth(format!("failed to read token response: {e}")))?;
    if !status.is_success() {
        return Err(Error::Auth(format!("token endpoint returned {status}: {}", body.trim())));
    }
    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| Error::Auth(format!("malformed token response: {e}")))?;
    Ok(token.access_token)
}

async fn azure_cli(audience: &str) -> Result<String> {
    debug!("requesting token from azure cli");
    let output = Command::new("az")
        .args(["account", "get-access-token", "--resource", audience, "--output", "json"])
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::Auth(format!("failed to run az: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Auth(format!("az exited with {}: {}", output.status, stderr.trim())));
    }
    let token: TokenResponse = serde_json::from_slice(&output.stdout)
        .map_err(|e| Error::Auth(format!("malformed az output: {e}")))?;
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, header, method, path, query_param},
    };

    use super::*;

    fn ambient_only(imds: Option<String>) -> AzureCredential {
        let mut credential = AzureCredential::new(
            CredentialSource::Ambient { client_id: None },
            "http://127.0.0.1:9",
            reqwest::Client::new(),
        )
        .with_imds_endpoint(imds)
        .with_azure_cli(false);
        credential.ambient.app_service = None;
        credential
    }

    fn imds_uri(server: &MockServer) -> Option<String> {
        Some(format!("{}/metadata/identity/oauth2/token", server.uri()))
    }

    #[test]
    fn test_source_kind_and_debug_hide_secrets() {
        let source = CredentialSource::ClientSecret {
            tenant_id: "t".to_string(),
            client_id: "c".to_string(),
            client_secret: "hunter2".to_string(),
        };
        assert_eq!(source.kind(), "client_secret");
        assert!(!format!("{source:?}").contains("hunter2"));
        assert_eq!(CredentialSource::Ambient { client_id: None }.kind(), "ambient");
    }

    #[tokio::test]
    async fn test_static_token_is_returned_verbatim() {
        let credential = AzureCredential::new(
            CredentialSource::Static {
                token: "abc".to_string(),
            },
            "http://127.0.0.1:9",
            reqwest::Client::new(),
        );
        assert_eq!(credential.token(GRAPH_AUDIENCE).await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_client_secret_posts_form_to_tenant_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-1"))
            .and(body_string_contains("scope=https%3A%2F%2Fgraph.microsoft.com%2F.default"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"token_type":"Bearer","expires_in":3599,"access_token":"sp-token"}"#,
                "application/json",
            ))
            .expect(2)
            .mount(&server)
            .await;

        let credential = AzureCredential::new(
            CredentialSource::ClientSecret {
                tenant_id: "tenant-1".to_string(),
                client_id: "client-1".to_string(),
                client_secret: "s3cret".to_string(),
            },
            server.uri(),
            reqwest::Client::new(),
        );

        // Tokens are fetched on every call.
        assert_eq!(credential.token(GRAPH_AUDIENCE).await.unwrap(), "sp-token");
        assert_eq!(credential.token(GRAPH_AUDIENCE).await.unwrap(), "sp-token");
    }

    #[tokio::test]
    async fn test_client_secret_rejection_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_client"}"#))
            .mount(&server)
            .await;

        let credential = AzureCredential::new(
            CredentialSource::ClientSecret {
                tenant_id: "t".to_string(),
                client_id: "c".to_string(),
                client_secret: "wrong".to_string(),
            },
            server.uri(),
            reqwest::Client::new(),
        );
        let err = credential.token(GRAPH_AUDIENCE).await.unwrap_err();
        assert!(matches!(err, Error::Auth(ref m) if m.contains("invalid_client")));
    }

    #[tokio::test]
    async fn test_ambient_uses_imds_with_metadata_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata/identity/oauth2/token"))
            .and(header("Metadata", "true"))
            .and(query_param("api-version", IMDS_API_VERSION))
            .and(query_param("resource", GRAPH_AUDIENCE))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"access_token":"mi-token","expires_in":"86399"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let credential = ambient_only(imds_uri(&server));
        assert_eq!(credential.token(GRAPH_AUDIENCE).await.unwrap(), "mi-token");
    }

    #[tokio::test]
    async fn test_ambient_prefers_app_service_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/msi/token"))
            .and(header("X-IDENTITY-HEADER", "secret-header"))
            .and(query_param("api-version", APP_SERVICE_API_VERSION))
            .and(query_param("client_id", "user-assigned"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"access_token":"app-token"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/metadata/identity/oauth2/token"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let credential = AzureCredential::new(
            CredentialSource::Ambient {
                client_id: Some("user-assigned".to_string()),
            },
            "http://127.0.0.1:9",
            reqwest::Client::new(),
        )
        .with_app_service(format!("{}/msi/token", server.uri()), "secret-header")
        .with_imds_endpoint(Some(format!("{}/metadata/identity/oauth2/token", server.uri())))
        .with_azure_cli(false);

        assert_eq!(credential.token(GRAPH_AUDIENCE).await.unwrap(), "app-token");
    }

    #[tokio::test]
    async fn test_ambient_exhaustion_reports_each_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Identity not found"))
            .mount(&server)
            .await;

        let err = ambient_only(imds_uri(&server))
            .token(GRAPH_AUDIENCE)
            .await
            .unwrap_err();
        match err {
            Error::Auth(message) => {
                assert!(message.contains("managed identity"));
                assert!(message.contains("Identity not found"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ambient_with_everything_disabled_fails() {
        let err = ambient_only(None).token(GRAPH_AUDIENCE).await.unwrap_err();
        assert!(err.to_string().contains("no credential sources enabled"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let source = CredentialSource::ClientSecret {
            tenant_id: "t".to_string(),
            client_id: "c".to_string(),
            client_secret: "hunter2".to_string(),
        };
        assert!(!format!("{source:?}").contains("hunter2"));
        let source = CredentialSource::Static {
            token: "eyJ0".to_string(),
        };
        assert!(!format!("{source:?}").contains("eyJ0"));
    }
}
