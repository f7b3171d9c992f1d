//! Authenticated Microsoft Graph HTTP calls.
//!
//! Paths passed to [`GraphClient`] are relative to the Graph base URL and
//! must already be percent-encoded (see [`crate::path`]).

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    credential::{GRAPH_AUDIENCE, TokenProvider},
    error::{Error, Result},
};

/// Thin wrapper over `reqwest` that attaches a fresh bearer token to every
/// request and turns non-2xx responses into [`Error::Operation`].
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    credential: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GraphClient {
    /// Creates a client rooted at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `endpoint` is empty.
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        credential: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        Ok(Self {
            http,
            base_url: normalize_base_url(endpoint)?,
            credential,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.http.get(self.url(path));
        let response = self.send_request(request).await?;
        decode_json(response).await
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Bytes> {
        let request = self.http.get(self.url(path));
        let response = self.send_request(request).await?;
        Ok(response.bytes().await?)
    }

    /// Issues a GET and discards the body. Used for existence probes.
    pub async fn probe(&self, path: &str) -> Result<()> {
        let request = self.http.get(self.url(path));
        self.send_request(request).await?;
        Ok(())
    }

    pub async fn put_bytes<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: Bytes,
    ) -> Result<T> {
        let request = self
            .http
            .put(self.url(path))
            .query(query)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body);
        let response = self.send_request(request).await?;
        decode_json(response).await
    }

    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes> {
        let request = self.http.post(self.url(path)).json(body);
        let response = self.send_request(request).await?;
        decode_json(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.http.delete(self.url(path));
        self.send_request(request).await?;
        Ok(())
    }

    async fn send_request(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let token = self.credential.token(GRAPH_AUDIENCE).await?;
        let response = request
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        debug!(url = %response.url(), %status, "graph response");
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::upstream(status, &body))
        }
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

fn normalize_base_url(endpoint: &str) -> Result<String> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(Error::Config("graph endpoint must not be empty".to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
