//! HTTP status classification
//!
//! Maps the outcome of an exchange to success or to one error kind. The
//! mapping depends only on the status and on the kind of request the
//! caller says it made; the request itself is never inspected.

use std::fmt;

use crate::error::{Error, Result};
use crate::types::{ApiErrorBody, ResponseInfo};

/// What the caller was doing when the response arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Plain metadata request (disk info)
    Metadata,
    /// Resolving an upload link
    UploadLink,
    /// Resolving a download link
    DownloadLink,
    /// Sending bytes to an upload link
    Upload,
    /// Reading bytes from a download link
    Download,
    /// Querying an asynchronous operation
    OperationStatus,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Metadata => "metadata",
            RequestKind::UploadLink => "upload link",
            RequestKind::DownloadLink => "download link",
            RequestKind::Upload => "upload",
            RequestKind::Download => "download",
            RequestKind::OperationStatus => "operation status",
        }
    }

    /// Context-specific wording for codes whose meaning depends on the request
    fn describe(self, code: u16) -> Option<&'static str> {
        match (self, code) {
            (_, 401) => Some("token is missing, expired or invalid"),
            (_, 403) => Some("permission denied"),
            (RequestKind::UploadLink, 409) => {
                Some("resource already exists or its parent folder is missing")
            }
            (RequestKind::UploadLink, 507) => Some("insufficient storage on the disk"),
            (RequestKind::DownloadLink, 404) => Some("resource not found"),
            (RequestKind::OperationStatus, 404) => Some("operation not found"),
            (RequestKind::Upload, 413) => Some("file exceeds the maximum upload size"),
            (RequestKind::Upload, 412) => Some("content range does not match the upload"),
            (RequestKind::Download, 416) => Some("requested range is outside the resource"),
            (RequestKind::Upload | RequestKind::Download, 405) => {
                Some("method does not match the transfer link")
            }
            (_, 429) => Some("rate limited"),
            _ => None,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a response
///
/// 2xx is success. 413 and 405 are matched exactly; every other code falls
/// into `Client` or `Server` by range and is never treated as success.
/// `body` is only consulted for the service's error document to enrich
/// the message.
pub fn classify(kind: RequestKind, info: &ResponseInfo, body: &[u8]) -> Result<()> {
    if info.is_success() {
        return Ok(());
    }

    let message = build_message(kind, info.status_code, body);
    let status = info.clone();

    tracing::warn!(kind = %kind, status = %status, "classified failed response");

    Err(match info.status_code {
        413 => Error::PayloadTooLarge { status, message },
        405 => Error::MethodNotAllowed { status, message },
        code if code >= 500 => Error::Server { status, message },
        _ => Error::Client { status, message },
    })
}

fn build_message(kind: RequestKind, code: u16, body: &[u8]) -> String {
    let context = kind.describe(code);
    match (ApiErrorBody::parse(body), context) {
        (Some(api), Some(ctx)) => format!("{kind} failed: {ctx} ({api})"),
        (Some(api), None) => format!("{kind} failed: {api}"),
        (None, Some(ctx)) => format!("{kind} failed: {ctx}"),
        (None, None) => format!("{kind} failed"),
    }
}
