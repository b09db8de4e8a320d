//! yd-core: Core library for the yd Yandex.Disk client
//!
//! This crate provides the core functionality for yd, including:
//! - Transfer link resolution for uploads and downloads
//! - Full and resumable (offset-based) transfers
//! - Asynchronous operation status queries
//! - Classification of HTTP outcomes into typed errors
//! - Configuration and profile management
//!
//! HTTP exchanges go through the [`Transport`] trait, so this crate does not
//! depend on any HTTP library and can be tested against mocks.

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
mod links;
mod operations;
pub mod path;
pub mod profile;
pub mod range;
pub mod traits;
mod transfer;
pub mod transport;
pub mod types;

pub use classify::{RequestKind, classify};
pub use client::{ClientConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL, DiskClient};
pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use path::DiskPath;
pub use profile::{PollConfig, Profile, ProfileManager, TimeoutConfig};
pub use range::{ContentRange, RangeFrom};
pub use traits::DiskApi;
pub use transport::{ApiRequest, ApiResponse, HttpMethod, Transport};
pub use types::{
    ApiErrorBody, Disk, DiskUser, OperationState, OperationStatus, ResponseInfo, TransferLink,
    TransferResult,
};
