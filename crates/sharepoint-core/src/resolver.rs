//! Lazy resolution of the site and default drive identifiers.

use std::sync::OnceLock;

use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    graph::GraphClient,
    path,
    types::{GraphIdentity, GraphList},
};

const SITES_MARKER: &str = "/sites/";

/// Hostname and server-relative site path parsed from a site URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteAddress {
    pub hostname: String,
    /// Path below `/sites/`, without surrounding slashes.
    pub site_path: String,
}

impl SiteAddress {
    /// Parses `https://<hostname>/sites/<path>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is unparseable, has no host, or
    /// does not contain `/sites/`.
    pub fn parse(site_url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(site_url.trim())
            .map_err(|e| Error::Config(format!("invalid site URL '{site_url}': {e}")))?;
        let hostname = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| Error::Config(format!("site URL '{site_url}' has no hostname")))?
            .to_string();
        let site_path = url
            .path()
            .split_once(SITES_MARKER)
            .map(|(_, rest)| rest.trim_matches('/'))
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "site URL '{site_url}' must look like https://<host>/sites/<name>"
                ))
            })?;
        let site_path = urlencoding::decode(site_path)
            .map_err(|e| Error::Config(format!("invalid site path in '{site_url}': {e}")))?
            .into_owned();
        Ok(Self {
            hostname,
            site_path,
        })
    }

    /// Graph path of the site-by-path lookup.
    pub fn lookup_path(&self) -> String {
        format!("sites/{}:/sites/{}", self.hostname, path::encode(&self.site_path))
    }
}

/// Resolves and caches the site id and the default drive id.
///
/// Each identifier is fetched at most once per resolver under sequential use.
/// Concurrent first callers may each perform the lookup; they all store the
/// same value.
#[derive(Debug)]
pub struct Resolver {
    graph: GraphClient,
    site_url: String,
    site_id: OnceLock<String>,
    drive_id: OnceLock<String>,
}

impl Resolver {
    pub fn new(graph: GraphClient, site_url: impl Into<String>) -> Self {
        Self {
            graph,
            site_url: site_url.into(),
            site_id: OnceLock::new(),
            drive_id: OnceLock::new(),
        }
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Returns the Graph site id for the configured site URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a malformed site URL or the upstream
    /// error if the lookup fails.
    pub async fn site_id(&self) -> Result<String> {
        if let Some(id) = self.site_id.get() {
            return Ok(id.clone());
        }
        let address = SiteAddress::parse(&self.site_url)?;
        debug!(hostname = %address.hostname, site = %address.site_path, "resolving site id");
        let site: GraphIdentity = self.graph.get_json(&address.lookup_path()).await?;
        info!(site_id = %site.id, "resolved site");
        Ok(self.site_id.get_or_init(|| site.id).clone())
    }

    /// Returns the id of the first drive listed for the site.
    ///
    /// The first entry is normally the default document library, but Graph
    /// does not guarantee the order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the site has no drives, or any error
    /// from [`Resolver::site_id`] or the drive listing.
    pub async fn default_drive_id(&self) -> Result<String> {
        if let Some(id) = self.drive_id.get() {
            return Ok(id.clone());
        }
        let site_id = self.site_id().await?;
        let drives: GraphList<GraphIdentity> =
            self.graph.get_json(&format!("sites/{site_id}/drives")).await?;
        let drive = drives
            .value
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no drives found for site {site_id}")))?;
        info!(drive_id = %drive.id, "resolved default drive");
        Ok(self.drive_id.get_or_init(|| drive.id).clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::credential::{AzureCredential, CredentialSource};

    fn resolver_for(server: &MockServer, site_url: &str) -> Resolver {
        let credential = AzureCredential::new(
            CredentialSource::Static {
                token: "test-token".to_string(),
            },
            server.uri(),
            reqwest::Client::new(),
        );
        let graph = GraphClient::new(
            reqwest::Client::new(),
            &format!("{}/v1.0", server.uri()),
            Arc::new(credential),
        )
        .unwrap();
        Resolver::new(graph, site_url)
    }

    async fn mount_site(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/v1.0/sites/contoso.sharepoint.com:/sites/eng"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"id":"site-id-1"}"#, "application/json"),
            )
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_site_url() {
        let address = SiteAddress::parse("https://contoso.sharepoint.com/sites/eng/").unwrap();
        assert_eq!(address.hostname, "contoso.sharepoint.com");
        assert_eq!(address.site_path, "eng");
        assert_eq!(address.lookup_path(), "sites/contoso.sharepoint.com:/sites/eng");
    }

    #[test]
    fn test_parse_site_url_with_spaces() {
        let address = SiteAddress::parse("https://contoso.sharepoint.com/sites/My%20Team").unwrap();
        assert_eq!(address.site_path, "My Team");
        assert_eq!(
            address.lookup_path(),
            "sites/contoso.sharepoint.com:/sites/My%20Team"
        );
    }

    #[test]
    fn test_parse_site_url_rejects_missing_sites_segment() {
        for url in [
            "https://contoso.sharepoint.com/teams/eng",
            "https://contoso.sharepoint.com/sites/",
            "not a url",
        ] {
            let err = SiteAddress::parse(url).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{url}: {err:?}");
        }
    }

    #[tokio::test]
    async fn test_site_id_is_fetched_once() {
        let server = MockServer::start().await;
        mount_site(&server, 1).await;

        let resolver = resolver_for(&server, "https://contoso.sharepoint.com/sites/eng");
        assert_eq!(resolver.site_id().await.unwrap(), "site-id-1");
        assert_eq!(resolver.site_id().await.unwrap(), "site-id-1");
    }

    #[tokio::test]
    async fn test_default_drive_is_first_and_fetched_once() {
        let server = MockServer::start().await;
        mount_site(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/v1.0/sites/site-id-1/drives"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"value":[{"id":"drive-1","name":"Documents"},{"id":"drive-2","name":"Other"}]}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_for(&server, "https://contoso.sharepoint.com/sites/eng");
        for _ in 0..3 {
            assert_eq!(resolver.default_drive_id().await.unwrap(), "drive-1");
        }
    }

    #[tokio::test]
    async fn test_no_drives_is_not_found() {
        let server = MockServer::start().await;
        mount_site(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/v1.0/sites/site-id-1/drives"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"value":[]}"#, "application/json"))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server, "https://contoso.sharepoint.com/sites/eng");
        let err = resolver.default_drive_id().await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/sites/contoso.sharepoint.com:/sites/eng"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_site(&server, 1).await;

        let resolver = resolver_for(&server, "https://contoso.sharepoint.com/sites/eng");
        assert!(resolver.site_id().await.is_err());
        assert_eq!(resolver.site_id().await.unwrap(), "site-id-1");
    }

    #[tokio::test]
    async fn test_malformed_site_url_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let resolver = resolver_for(&server, "https://contoso.sharepoint.com/teams/eng");
        assert!(matches!(resolver.site_id().await, Err(Error::Config(_))));
    }
}
