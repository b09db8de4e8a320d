//! DiskApi trait definition
//!
//! This trait defines the operations the CLI needs from the disk service.
//! It allows callers to be decoupled from the concrete client and lets
//! caller-side loops be tested against fakes.

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::error::Result;
use crate::types::{Disk, OperationStatus, TransferLink, TransferResult};

/// Trait for disk service operations
#[async_trait]
pub trait DiskApi: Send + Sync {
    /// Get disk metadata
    async fn get_disk(&self, fields: &[&str]) -> Result<Disk>;

    /// Resolve an upload link for a resource path
    async fn resolve_upload_link(
        &self,
        path: &str,
        fields: &[&str],
        overwrite: bool,
    ) -> Result<TransferLink>;

    /// Resolve a download link for a resource path
    async fn resolve_download_link(&self, path: &str, fields: &[&str]) -> Result<TransferLink>;

    /// Upload the whole source
    async fn upload_full(&self, link: &TransferLink, data: Vec<u8>) -> Result<TransferResult>;

    /// Upload the source from `offset` onwards
    async fn upload_partial(
        &self,
        link: &TransferLink,
        data: Vec<u8>,
        offset: u64,
    ) -> Result<TransferResult>;

    /// Download the full body
    async fn download_full(&self, link: &TransferLink) -> Result<Vec<u8>>;

    /// Download the full body into a sink
    async fn download_to(
        &self,
        link: &TransferLink,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<TransferResult>;

    /// Download from `offset` to the end
    async fn download_from(&self, link: &TransferLink, offset: u64) -> Result<Vec<u8>>;

    /// Query an asynchronous operation once
    async fn get_operation_status(
        &self,
        operation_id: &str,
        fields: &[&str],
    ) -> Result<OperationStatus>;
}
