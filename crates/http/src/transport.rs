//! reqwest-backed transport
//!
//! Executes prebuilt requests and hands every response back unclassified.
//! Only failures below the HTTP status level become errors here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use yd_core::{
    ApiRequest, ApiResponse, Error, HttpMethod, Profile, ResponseInfo, Result, TimeoutConfig,
    Transport,
};

const USER_AGENT: &str = concat!("yd/", env!("CARGO_PKG_VERSION"));

/// HTTP transport using a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    /// Create a transport with the given connect and request deadlines
    pub fn new(timeout: &TimeoutConfig) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_millis(timeout.connect_ms))
            .timeout(Duration::from_millis(timeout.request_ms))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http_client })
    }

    /// Create a transport from a profile's timeout settings
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        Self::new(&profile.timeout_config())
    }

    /// Wrap an existing reqwest client
    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn map_error(error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout(format!("Request timed out: {error}"))
        } else {
            Error::Transport(format!("Request failed: {error}"))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let ApiRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut request_builder = self.http_client.request(Self::method(method), &url);

        for (name, value) in &headers {
            request_builder = request_builder.header(name.as_str(), value.as_str());
        }

        // PUT with an empty body still needs an explicit zero length
        if !body.is_empty() || matches!(method, HttpMethod::Put | HttpMethod::Post) {
            request_builder = request_builder.body(body);
        }

        let response = request_builder.send().await.map_err(Self::map_error)?;

        let status = response.status();
        let info = ResponseInfo::new(status.to_string(), status.as_u16());
        let body = response.bytes().await.map_err(Self::map_error)?.to_vec();

        tracing::trace!(%method, %url, status = %info, bytes = body.len(), "exchange complete");
        Ok(ApiResponse::new(info, body))
    }
}
