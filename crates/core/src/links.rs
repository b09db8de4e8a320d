//! Transfer link resolution
//!
//! Asks the API for a short-lived upload or download link. The only side
//! effect is the single metadata request.

use crate::classify::RequestKind;
use crate::client::{DiskClient, push_fields};
use crate::error::Result;
use crate::path::DiskPath;
use crate::transport::HttpMethod;
use crate::types::TransferLink;

impl DiskClient {
    /// Resolve a link for uploading to `path`
    ///
    /// With `overwrite` false the server refuses paths that already hold a
    /// resource (409).
    pub async fn resolve_upload_link(
        &self,
        path: &str,
        fields: &[&str],
        overwrite: bool,
    ) -> Result<TransferLink> {
        let path = DiskPath::parse(path)?;

        let mut query = vec![
            ("path", path.to_string()),
            ("overwrite", overwrite.to_string()),
        ];
        push_fields(&mut query, fields);
        let url = self.api_url(&["resources", "upload"], &query)?;

        let link: TransferLink = self
            .call(RequestKind::UploadLink, self.api_request(HttpMethod::Get, url))
            .await?;

        tracing::debug!(
            path = %path,
            method = %link.method,
            operation_id = %link.operation_id,
            "resolved upload link"
        );
        Ok(link)
    }

    /// Resolve a link for downloading `path`
    pub async fn resolve_download_link(&self, path: &str, fields: &[&str]) -> Result<TransferLink> {
        let path = DiskPath::parse(path)?;

        let mut query = vec![("path", path.to_string())];
        push_fields(&mut query, fields);
        let url = self.api_url(&["resources", "download"], &query)?;

        let link: TransferLink = self
            .call(RequestKind::DownloadLink, self.api_request(HttpMethod::Get, url))
            .await?;

        tracing::debug!(path = %path, method = %link.method, "resolved download link");
        Ok(link)
    }
}
