//! Transfer executor
//!
//! Moves bytes to and from a resolved [`TransferLink`]. Transfer links are
//! pre-signed, so no authentication header is sent with them.
//!
//! Failures are not rolled back: a download that fails while writing to a
//! sink may leave part of the body in the sink, and a deadline expiring
//! mid-upload leaves whatever the server already received in place.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use url::Url;

use crate::classify::{RequestKind, classify};
use crate::client::DiskClient;
use crate::error::{Error, Result};
use crate::range::{ContentRange, RangeFrom};
use crate::transport::{ApiRequest, ApiResponse, HttpMethod};
use crate::types::{TransferLink, TransferResult};

/// Check a link is usable and turn it into a bare request
fn link_request(link: &TransferLink) -> Result<ApiRequest> {
    if link.templated {
        return Err(Error::Validation(format!(
            "Transfer link '{}' is templated and cannot be used directly",
            link.href
        )));
    }

    let method: HttpMethod = link.method.parse()?;

    let url = Url::parse(&link.href)
        .map_err(|e| Error::Validation(format!("Invalid transfer link '{}': {e}", link.href)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::Validation(format!(
            "Transfer link '{}' must use http or https",
            link.href
        )));
    }

    Ok(ApiRequest::new(method, link.href.clone()))
}

fn transfer_result(response: &ApiResponse, bytes: u64) -> TransferResult {
    TransferResult {
        bytes_transferred: bytes,
        success: response.info.is_success(),
        status: response.info.clone(),
    }
}

impl DiskClient {
    /// Upload the whole source to the link
    ///
    /// The server normally acknowledges with 201 Created; any 2xx counts as
    /// success.
    pub async fn upload_full(&self, link: &TransferLink, data: Vec<u8>) -> Result<TransferResult> {
        let request = link_request(link)?;
        let bytes = data.len() as u64;

        let response = self.send(request.body(data)).await?;
        classify(RequestKind::Upload, &response.info, &response.body)?;

        tracing::debug!(
            operation_id = %link.operation_id,
            bytes,
            status = %response.info,
            "upload complete"
        );
        Ok(transfer_result(&response, bytes))
    }

    /// Upload the source from `offset` onwards, resuming an interrupted upload
    ///
    /// The caller tracks how many bytes the server already holds. An offset
    /// past the end of the source fails before any request is made; an
    /// offset equal to its length sends an empty body announcing the total.
    pub async fn upload_partial(
        &self,
        link: &TransferLink,
        mut data: Vec<u8>,
        offset: u64,
    ) -> Result<TransferResult> {
        let total = data.len() as u64;
        let range = ContentRange::from_offset(offset, total)?;
        let request = link_request(link)?;

        let start = usize::try_from(offset)
            .map_err(|_| Error::Validation(format!("offset {offset} does not fit in memory")))?;
        let tail = data.split_off(start);
        let bytes = tail.len() as u64;

        let request = request.header("Content-Range", range.to_string()).body(tail);
        let response = self.send(request).await?;
        classify(RequestKind::Upload, &response.info, &response.body)?;

        tracing::debug!(
            operation_id = %link.operation_id,
            offset,
            bytes,
            total,
            status = %response.info,
            "partial upload complete"
        );
        Ok(transfer_result(&response, bytes))
    }

    /// Download the full body behind the link
    pub async fn download_full(&self, link: &TransferLink) -> Result<Vec<u8>> {
        let response = self.fetch(link, None).await?;
        tracing::debug!(bytes = response.body.len(), "download complete");
        Ok(response.body)
    }

    /// Download the body behind the link into `sink`
    ///
    /// If writing to the sink fails part way, the bytes already written stay
    /// there.
    pub async fn download_to(
        &self,
        link: &TransferLink,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<TransferResult> {
        let response = self.fetch(link, None).await?;
        sink.write_all(&response.body).await?;
        sink.flush().await?;

        let bytes = response.body.len() as u64;
        tracing::debug!(bytes, "download written to sink");
        Ok(transfer_result(&response, bytes))
    }

    /// Download everything from `offset` to the end of the resource
    ///
    /// Servers that ignore the `Range` header answer 200 with the full body;
    /// the leading bytes are dropped so the result is the same either way.
    pub async fn download_from(&self, link: &TransferLink, offset: u64) -> Result<Vec<u8>> {
        let response = self.fetch(link, Some(RangeFrom(offset))).await?;

        if response.info.status_code == 206 {
            return Ok(response.body);
        }

        let mut body = response.body;
        let total = body.len() as u64;
        if offset > total {
            return Err(Error::Validation(format!(
                "offset {offset} is beyond the end of the resource ({total} bytes)"
            )));
        }
        // offset <= body.len(), so it fits in usize
        Ok(body.split_off(offset as usize))
    }

    async fn fetch(&self, link: &TransferLink, range: Option<RangeFrom>) -> Result<ApiResponse> {
        let mut request = link_request(link)?;
        if let Some(range) = range {
            request = request.header("Range", range.to_string());
        }

        let response = self.send(request).await?;
        classify(RequestKind::Download, &response.info, &response.body)?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::client::ClientConfig;
    use crate::transport::MockTransport;
    use crate::types::ResponseInfo;

    use super::*;

    fn client_with(mock: MockTransport) -> DiskClient {
        DiskClient::new(ClientConfig::new("token"), Arc::new(mock)).unwrap()
    }

    fn upload_link() -> TransferLink {
        TransferLink {
            href: "https://uploader.example.net/upload-target/42".into(),
            method: "PUT".into(),
            templated: false,
            operation_id: "op-42".into(),
        }
    }

    fn download_link() -> TransferLink {
        TransferLink {
            href: "https://downloader.example.net/disk/42".into(),
            method: "GET".into(),
            templated: false,
            operation_id: String::new(),
        }
    }

    #[tokio::test]
    async fn test_upload_full() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Put
                    && req.url == "https://uploader.example.net/upload-target/42"
                    && req.body == b"hello world"
                    && req.header_value("Authorization").is_none()
                    && req.header_value("Content-Range").is_none()
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::new(
                    ResponseInfo::new("201 created", 201),
                    Vec::new(),
                ))
            });

        let result = client_with(mock)
            .upload_full(&upload_link(), b"hello world".to_vec())
            .await
            .unwrap();
        assert_eq!(result.bytes_transferred, 11);
        assert!(result.success);
        assert_eq!(result.status.status_code, 201);
    }

    #[tokio::test]
    async fn test_upload_full_payload_too_large() {
        let mut mock = MockTransport::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(ApiResponse::new(
                ResponseInfo::new("413 payload too large", 413),
                Vec::new(),
            ))
        });

        let err = client_with(mock)
            .upload_full(&upload_link(), vec![0; 16])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_upload_wrong_method() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| req.method == HttpMethod::Get)
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::new(
                    ResponseInfo::new("405 METHOD NOT ALLOWED", 405),
                    Vec::new(),
                ))
            });

        let link = TransferLink {
            method: "GET".into(),
            ..upload_link()
        };
        let err = client_with(mock)
            .upload_full(&link, vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MethodNotAllowed { .. }));
    }

    #[tokio::test]
    async fn test_upload_server_error_is_retryable() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(ResponseInfo::from_code(503), Vec::new())));

        let err = client_with(mock)
            .upload_full(&upload_link(), vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Server { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_upload_partial_sends_tail_with_content_range() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Put
                    && req.body == b"56789"
                    && req.header_value("Content-Range") == Some("bytes 5-9/10")
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::new(
                    ResponseInfo::new("201 created", 201),
                    Vec::new(),
                ))
            });

        let result = client_with(mock)
            .upload_partial(&upload_link(), b"0123456789".to_vec(), 5)
            .await
            .unwrap();
        assert_eq!(result.bytes_transferred, 5);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_upload_partial_at_end_sends_empty_body() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| req.body.is_empty() && req.header_value("Content-Range") == Some("bytes */4"))
            .times(1)
            .returning(|_| Ok(ApiResponse::new(ResponseInfo::from_code(201), Vec::new())));

        let result = client_with(mock)
            .upload_partial(&upload_link(), vec![1, 2, 3, 4], 4)
            .await
            .unwrap();
        assert_eq!(result.bytes_transferred, 0);
    }

    #[tokio::test]
    async fn test_upload_partial_offset_beyond_source_fails_fast() {
        let mut mock = MockTransport::new();
        mock.expect_execute().never();

        let err = client_with(mock)
            .upload_partial(&upload_link(), vec![1, 2, 3], 4)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_templated_link_is_rejected() {
        let mut mock = MockTransport::new();
        mock.expect_execute().never();
        let client = client_with(mock);

        let link = TransferLink {
            href: "https://uploader.example.net/{id}".into(),
            templated: true,
            ..upload_link()
        };
        assert!(matches!(
            client.upload_full(&link, vec![1]).await,
            Err(Error::Validation(_))
        ));

        let link = TransferLink {
            method: "TELEPORT".into(),
            ..upload_link()
        };
        assert!(matches!(
            client.upload_full(&link, vec![1]).await,
            Err(Error::Validation(_))
        ));

        let link = TransferLink {
            href: "not a url".into(),
            ..download_link()
        };
        assert!(matches!(
            client.download_full(&link).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_download_full() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Get
                    && req.url == "https://downloader.example.net/disk/42"
                    && req.header_value("Range").is_none()
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::new(
                    ResponseInfo::from_code(200),
                    b"payload".to_vec(),
                ))
            });

        let data = client_with(mock)
            .download_full(&download_link())
            .await
            .unwrap();
        assert_eq!(data, b"payload");
    }

    #[tokio::test]
    async fn test_download_to_sink() {
        let mut mock = MockTransport::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(ApiResponse::new(
                ResponseInfo::from_code(200),
                b"streamed bytes".to_vec(),
            ))
        });

        let mut sink: Vec<u8> = Vec::new();
        let result = client_with(mock)
            .download_to(&download_link(), &mut sink)
            .await
            .unwrap();
        assert_eq!(result.bytes_transferred, 14);
        assert_eq!(sink, b"streamed bytes");
    }

    #[tokio::test]
    async fn test_download_error_leaves_sink_untouched() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(ResponseInfo::from_code(404), b"gone".to_vec())));

        let mut sink: Vec<u8> = Vec::new();
        let err = client_with(mock)
            .download_to(&download_link(), &mut sink)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_download_from_partial_content() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| req.header_value("Range") == Some("bytes=3-"))
            .times(1)
            .returning(|_| Ok(ApiResponse::new(ResponseInfo::from_code(206), b"3456".to_vec())));

        let data = client_with(mock)
            .download_from(&download_link(), 3)
            .await
            .unwrap();
        assert_eq!(data, b"3456");
    }

    #[tokio::test]
    async fn test_download_from_range_ignored() {
        let mut mock = MockTransport::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(ApiResponse::new(
                ResponseInfo::from_code(200),
                b"0123456".to_vec(),
            ))
        });

        let data = client_with(mock)
            .download_from(&download_link(), 3)
            .await
            .unwrap();
        assert_eq!(data, b"3456");
    }

    #[tokio::test]
    async fn test_download_from_unsatisfiable_range() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(ResponseInfo::from_code(416), Vec::new())));

        let err = client_with(mock)
            .download_from(&download_link(), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Client { .. }));
        assert!(err.to_string().contains("outside the resource"));
    }
}
