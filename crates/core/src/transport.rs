//! Transport trait definition
//!
//! The transport performs a single HTTP exchange and reports its outcome.
//! It is implemented by the HTTP adapter crate and can be mocked for
//! testing, keeping this crate independent of any HTTP library.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::types::ResponseInfo;

/// HTTP verbs used by the API and by transfer links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Put,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "PUT" => Ok(HttpMethod::Put),
            "POST" => Ok(HttpMethod::Post),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(Error::Validation(format!("unsupported HTTP method '{other}'"))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request: absolute URL with query, headers and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Look up a header value by case-insensitive name
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub info: ResponseInfo,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(info: ResponseInfo, body: Vec<u8>) -> Self {
        Self { info, body }
    }

    /// Decode the body into the caller's chosen shape
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Performs HTTP exchanges on behalf of the client
///
/// Implementations return `Ok` for every exchange that produced a status
/// line, including 4xx/5xx; classifying those is the caller's job. `Err`
/// is reserved for `Error::Transport` and `Error::Timeout`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!("PUT".parse::<HttpMethod>().unwrap(), HttpMethod::Put);
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!(" Post ".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert!(matches!(
            "BREW".parse::<HttpMethod>(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::new(HttpMethod::Put, "https://example.com/upload")
            .header("Content-Range", "bytes 0-1/2")
            .body(vec![1, 2]);
        assert_eq!(req.header_value("content-range"), Some("bytes 0-1/2"));
        assert_eq!(req.header_value("authorization"), None);
        assert_eq!(req.body, vec![1, 2]);
    }

    #[test]
    fn test_response_json() {
        let resp = ApiResponse::new(ResponseInfo::from_code(200), br#"{"status":"success"}"#.to_vec());
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["status"], "success");

        let resp = ApiResponse::new(ResponseInfo::from_code(200), b"<html>".to_vec());
        assert!(matches!(resp.json::<serde_json::Value>(), Err(Error::Json(_))));
    }
}
