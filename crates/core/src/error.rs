//! Error types for yd-core
//!
//! Every non-2xx response is classified into exactly one variant before it
//! reaches the caller. Variants carry the original status so callers can
//! branch on the kind and decide whether to retry.

use thiserror::Error;

use crate::types::ResponseInfo;

/// Result type alias for yd-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for yd-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bad local input; never sent over the network
    #[error("Validation error: {0}")]
    Validation(String),

    /// DNS, connection or protocol failure below HTTP status level
    #[error("Transport error: {0}")]
    Transport(String),

    /// Deadline expired before the exchange completed
    #[error("Timed out: {0}")]
    Timeout(String),

    /// 413: the server refused the payload size
    #[error("Payload too large ({status}): {message}")]
    PayloadTooLarge { status: ResponseInfo, message: String },

    /// 405: wrong verb for the given link or endpoint
    #[error("Method not allowed ({status}): {message}")]
    MethodNotAllowed { status: ResponseInfo, message: String },

    /// Any other 4xx (and unexpected sub-500 codes)
    #[error("Client error ({status}): {message}")]
    Client { status: ResponseInfo, message: String },

    /// 5xx (and anything at or above 600)
    #[error("Server error ({status}): {message}")]
    Server { status: ResponseInfo, message: String },

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Status of the HTTP exchange that produced this error, if any
    pub fn status(&self) -> Option<&ResponseInfo> {
        match self {
            Error::PayloadTooLarge { status, .. }
            | Error::MethodNotAllowed { status, .. }
            | Error::Client { status, .. }
            | Error::Server { status, .. } => Some(status),
            _ => None,
        }
    }

    /// Numeric HTTP status code, if any
    pub fn status_code(&self) -> Option<u16> {
        self.status().map(|s| s.status_code)
    }

    /// Whether the caller may retry the same request with backoff
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Timeout(_) | Error::Server { .. } => true,
            Error::Client { status, .. } => status.status_code == 429,
            _ => false,
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::Config(_) => 2, // UsageError
            Error::Transport(_) | Error::Timeout(_) | Error::Server { .. } => 3, // NetworkError
            Error::Client { status, .. } => match status.status_code {
                401 | 403 => 4, // AuthError
                404 => 5,       // NotFound
                409 | 412 => 6, // Conflict
                429 => 3,       // NetworkError
                _ => 1,
            },
            Error::ProfileNotFound(_) => 5,
            Error::PayloadTooLarge { .. } => 8, // PayloadTooLarge
            _ => 1,                             // GeneralError
        }
    }
}
