//! Data types exchanged with the disk API
//!
//! Mirrors the JSON documents of the REST API (links, operation status,
//! disk metadata, error bodies) plus the client-side transfer outcome.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a single HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    /// Full status line, e.g. "201 Created"
    pub status_text: String,

    /// Numeric HTTP status code
    pub status_code: u16,
}

impl ResponseInfo {
    pub fn new(status_text: impl Into<String>, status_code: u16) -> Self {
        Self {
            status_text: status_text.into(),
            status_code,
        }
    }

    /// Build from a bare code, using the canonical reason phrase when one is known
    pub fn from_code(status_code: u16) -> Self {
        let reason = canonical_reason(status_code);
        let status_text = if reason.is_empty() {
            status_code.to_string()
        } else {
            format!("{status_code} {reason}")
        };
        Self {
            status_text,
            status_code,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl fmt::Display for ResponseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status_text.is_empty() {
            write!(f, "{}", self.status_code)
        } else {
            write!(f, "{}", self.status_text)
        }
    }
}

fn canonical_reason(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        409 => "Conflict",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        423 => "Locked",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        507 => "Insufficient Storage",
        _ => "",
    }
}

/// A short-lived, server-issued link for moving resource bytes
///
/// Links expire on the server side; the client does not track expiry, so a
/// link should be used soon after it is resolved. A resumed upload reuses
/// the same link and operation id with a new byte range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLink {
    /// Absolute URL to send the transfer request to
    pub href: String,

    /// HTTP verb to use against `href`
    pub method: String,

    /// Whether `href` is a URI template that must be expanded first
    #[serde(default)]
    pub templated: bool,

    /// Server-side operation tracking the transfer (empty for downloads)
    #[serde(default)]
    pub operation_id: String,
}

/// Result of a completed transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    /// Number of payload bytes sent or received in this exchange
    pub bytes_transferred: u64,

    /// Whether the server acknowledged the transfer
    pub success: bool,

    /// Status line returned by the server
    pub status: ResponseInfo,
}

/// State of a server-side asynchronous operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationState {
    InProgress,
    Success,
    Failed,
}

impl OperationState {
    /// Terminal states end a polling loop
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationState::Success | OperationState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationState::InProgress => "in-progress",
            OperationState::Success => "success",
            OperationState::Failed => "failed",
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of an operation's status as reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub status: OperationState,

    /// Any other fields the server returned
    #[serde(flatten)]
    pub raw: BTreeMap<String, serde_json::Value>,
}

impl OperationStatus {
    pub fn new(status: OperationState) -> Self {
        Self {
            status,
            raw: BTreeMap::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Owner of the disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUser {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub uid: String,
}

/// Disk metadata
///
/// All fields are optional on the wire because the `fields` query
/// parameter may narrow the response to a subset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    #[serde(default)]
    pub unlimited_autoupload_enabled: bool,
    #[serde(default)]
    pub max_file_size: u64,
    #[serde(default)]
    pub total_space: u64,
    #[serde(default)]
    pub trash_size: u64,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub used_space: u64,
    #[serde(default)]
    pub system_folders: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<DiskUser>,
    #[serde(default)]
    pub revision: u64,
}

impl Disk {
    /// Bytes still available
    pub fn free_space(&self) -> u64 {
        self.total_space.saturating_sub(self.used_space)
    }
}

/// Error document returned by the API for failed requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error id, e.g. "DiskPathPointsToExistentDirectoryError"
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub description: String,
}

impl ApiErrorBody {
    /// Parse an error body, returning `None` unless it carries at least an id or message
    pub fn parse(body: &[u8]) -> Option<Self> {
        let parsed: Self = serde_json::from_slice(body).ok()?;
        if parsed.error.is_empty() && parsed.message.is_empty() && parsed.description.is_empty()
        {
            None
        } else {
            Some(parsed)
        }
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = if !self.message.is_empty() {
            &self.message
        } else {
            &self.description
        };
        match (self.error.is_empty(), text.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.error, text),
            (false, true) => f.write_str(&self.error),
            _ => f.write_str(text),
        }
    }
}
