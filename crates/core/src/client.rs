//! Disk API client
//!
//! Holds the validated connection settings and the transport, and provides
//! the request plumbing shared by the link resolver, the transfer executor
//! and the operation poller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWrite;
use url::Url;

use crate::classify::{RequestKind, classify};
use crate::error::{Error, Result};
use crate::traits::DiskApi;
use crate::transport::{ApiRequest, ApiResponse, HttpMethod, Transport};
use crate::types::{Disk, OperationStatus, TransferLink, TransferResult};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://cloud-api.yandex.net";

/// Default API version
pub const DEFAULT_API_VERSION: u32 = 1;

/// Connection settings for a [`DiskClient`]
#[derive(Clone)]
pub struct ClientConfig {
    /// OAuth token
    pub token: String,

    /// API endpoint, without version or path
    pub base_url: String,

    /// API version segment ("v1")
    pub api_version: u32,

    /// Deadline applied to every network call
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION,
            timeout: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Client for the disk REST API
///
/// Holds no mutable state; it can be shared across tasks as long as each
/// call works with its own link or operation id.
pub struct DiskClient {
    transport: Arc<dyn Transport>,
    token: String,
    api_root: Url,
    timeout: Option<Duration>,
}

impl DiskClient {
    /// Create a client, validating the configuration up front
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let token = config.token.trim();
        if token.is_empty() {
            return Err(Error::Validation("OAuth token cannot be empty".into()));
        }

        if config.api_version == 0 {
            return Err(Error::Validation("API version must be at least 1".into()));
        }

        let api_root = build_api_root(&config.base_url, config.api_version)?;

        tracing::debug!(api_root = %api_root, "created disk client");

        Ok(Self {
            transport,
            token: token.to_string(),
            api_root,
            timeout: config.timeout,
        })
    }

    /// Root URL all API paths hang off ("{base}/v{n}/disk")
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Build an API URL from path segments and query pairs
    ///
    /// Segments are percent-encoded individually, so ids cannot escape
    /// their position in the path.
    pub(crate) fn api_url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<String> {
        let mut url = self.api_root.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::Validation("API root cannot hold a path".into()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.into())
    }

    /// Request against the API with authentication headers
    pub(crate) fn api_request(&self, method: HttpMethod, url: String) -> ApiRequest {
        ApiRequest::new(method, url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("OAuth {}", self.token))
    }

    /// Execute a request within the configured deadline
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let method = request.method;
        tracing::debug!(
            method = %method,
            url = %request.url,
            body_bytes = request.body.len(),
            "sending request"
        );

        let exchange = self.transport.execute(request);
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
                Error::Timeout(format!(
                    "{method} request did not complete within {}ms",
                    limit.as_millis()
                ))
            })??,
            None => exchange.await?,
        };

        tracing::debug!(method = %method, status = %response.info, "received response");
        Ok(response)
    }

    /// Execute, classify and decode a JSON API call
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        kind: RequestKind,
        request: ApiRequest,
    ) -> Result<T> {
        let response = self.send(request).await?;
        classify(kind, &response.info, &response.body)?;
        response.json()
    }

    /// Get disk metadata, optionally narrowed to the given fields
    pub async fn get_disk(&self, fields: &[&str]) -> Result<Disk> {
        let mut query = Vec::new();
        push_fields(&mut query, fields);
        let url = self.api_url(&[], &query)?;
        self.call(RequestKind::Metadata, self.api_request(HttpMethod::Get, url))
            .await
    }
}

impl fmt::Debug for DiskClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskClient")
            .field("api_root", &self.api_root.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn build_api_root(base_url: &str, version: u32) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| Error::Validation(format!("Invalid base URL '{base_url}': {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::Validation(format!(
            "Base URL '{base_url}' must use http or https"
        )));
    }

    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| Error::Validation(format!("Base URL '{base_url}' cannot hold a path")))?
        .pop_if_empty()
        .push(&format!("v{version}"))
        .push("disk");
    Ok(url)
}

/// Append the field-selection parameter when fields were requested
pub(crate) fn push_fields(query: &mut Vec<(&str, String)>, fields: &[&str]) {
    if !fields.is_empty() {
        query.push(("fields", fields.join(",")));
    }
}

#[async_trait]
impl DiskApi for DiskClient {
    async fn get_disk(&self, fields: &[&str]) -> Result<Disk> {
        DiskClient::get_disk(self, fields).await
    }

    async fn resolve_upload_link(
        &self,
        path: &str,
        fields: &[&str],
        overwrite: bool,
    ) -> Result<TransferLink> {
        DiskClient::resolve_upload_link(self, path, fields, overwrite).await
    }

    async fn resolve_download_link(&self, path: &str, fields: &[&str]) -> Result<TransferLink> {
        DiskClient::resolve_download_link(self, path, fields).await
    }

    async fn upload_full(&self, link: &TransferLink, data: Vec<u8>) -> Result<TransferResult> {
        DiskClient::upload_full(self, link, data).await
    }

    async fn upload_partial(
        &self,
        link: &TransferLink,
        data: Vec<u8>,
        offset: u64,
    ) -> Result<TransferResult> {
        DiskClient::upload_partial(self, link, data, offset).await
    }

    async fn download_full(&self, link: &TransferLink) -> Result<Vec<u8>> {
        DiskClient::download_full(self, link).await
    }

    async fn download_to(
        &self,
        link: &TransferLink,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<TransferResult> {
        DiskClient::download_to(self, link, sink).await
    }

    async fn download_from(&self, link: &TransferLink, offset: u64) -> Result<Vec<u8>> {
        DiskClient::download_from(self, link, offset).await
    }

    async fn get_operation_status(
        &self,
        operation_id: &str,
        fields: &[&str],
    ) -> Result<OperationStatus> {
        DiskClient::get_operation_status(self, operation_id, fields).await
    }
}
