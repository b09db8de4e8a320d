//! Asynchronous operation status
//!
//! A single status query per call. Looping until a terminal state, and the
//! backoff between queries, belong to the caller.

use crate::classify::RequestKind;
use crate::client::{DiskClient, push_fields};
use crate::error::{Error, Result};
use crate::transport::HttpMethod;
use crate::types::OperationStatus;

impl DiskClient {
    /// Query the current status of an operation
    pub async fn get_operation_status(
        &self,
        operation_id: &str,
        fields: &[&str],
    ) -> Result<OperationStatus> {
        let operation_id = operation_id.trim();
        if operation_id.is_empty() {
            return Err(Error::Validation("Operation id cannot be empty".into()));
        }

        let mut query = Vec::new();
        push_fields(&mut query, fields);
        let url = self.api_url(&["operations", operation_id], &query)?;

        let status: OperationStatus = self
            .call(
                RequestKind::OperationStatus,
                self.api_request(HttpMethod::Get, url),
            )
            .await?;

        tracing::debug!(operation_id, status = %status.status, "polled operation");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::client::ClientConfig;
    use crate::transport::{ApiResponse, MockTransport};
    use crate::types::{OperationState, ResponseInfo};

    use super::*;

    fn client_with(mock: MockTransport) -> DiskClient {
        DiskClient::new(ClientConfig::new("token"), Arc::new(mock)).unwrap()
    }

    #[tokio::test]
    async fn test_get_operation_status() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| {
                req.url == "https://cloud-api.yandex.net/v1/disk/operations/op-42?fields=status"
                    && req.header_value("Authorization") == Some("OAuth token")
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::new(
                    ResponseInfo::from_code(200),
                    br#"{"status": "success"}"#.to_vec(),
                ))
            });

        let status = client_with(mock)
            .get_operation_status("op-42", &["status"])
            .await
            .unwrap();
        assert_eq!(status.status, OperationState::Success);
        assert!(status.is_terminal());
    }

    #[tokio::test]
    async fn test_repeated_polls_return_same_snapshot() {
        let mut mock = MockTransport::new();
        mock.expect_execute().times(3).returning(|_| {
            Ok(ApiResponse::new(
                ResponseInfo::from_code(200),
                br#"{"status": "in-progress", "progress": 12}"#.to_vec(),
            ))
        });
        let client = client_with(mock);

        let first = client.get_operation_status("op-1", &[]).await.unwrap();
        let second = client.get_operation_status("op-1", &[]).await.unwrap();
        let third = client.get_operation_status("op-1", &[]).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);
        assert!(!first.is_terminal());
    }

    #[tokio::test]
    async fn test_failed_operation_is_terminal() {
        let mut mock = MockTransport::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(ApiResponse::new(
                ResponseInfo::from_code(200),
                br#"{"status": "failed"}"#.to_vec(),
            ))
        });

        let status = client_with(mock)
            .get_operation_status("op-9", &[])
            .await
            .unwrap();
        assert_eq!(status.status, OperationState::Failed);
        assert!(status.is_terminal());
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(ResponseInfo::from_code(404), Vec::new())));

        let err = client_with(mock)
            .get_operation_status("nope", &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("operation not found"));
    }

    #[tokio::test]
    async fn test_empty_operation_id_issues_no_request() {
        let mut mock = MockTransport::new();
        mock.expect_execute().never();

        let err = client_with(mock)
            .get_operation_status("  ", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_unexpected_status_value_is_json_error() {
        let mut mock = MockTransport::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(ApiResponse::new(
                ResponseInfo::from_code(200),
                br#"{"status": "paused"}"#.to_vec(),
            ))
        });

        let err = client_with(mock)
            .get_operation_status("op-1", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
