//! End-to-end transfer workflows against an in-memory disk service
//!
//! The fake service speaks the same REST conventions as the real API:
//! link resolution, pre-signed upload/download hrefs with byte ranges, and
//! operation status documents.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::RngCore;
use url::Url;

use yd_core::{
    ApiRequest, ApiResponse, ClientConfig, DiskClient, Error, HttpMethod, OperationState,
    ResponseInfo, Result, Transport,
};

const API: &str = "http://api.test";
const UPLOADER: &str = "http://uploader.test";
const DOWNLOADER: &str = "http://downloader.test";
const TOKEN: &str = "test-token";

/// An upload in flight: where it goes and what has arrived so far
struct Staged {
    path: String,
    expected: Option<usize>,
    received: Vec<u8>,
}

#[derive(Default)]
struct State {
    files: HashMap<String, Vec<u8>>,
    staged: HashMap<String, Staged>,
    operations: HashMap<String, OperationState>,
    next_id: u64,
    /// Next upload stops after this many bytes and fails the connection
    interrupt_after: Option<usize>,
    /// Leave completed uploads in progress until released
    hold_operations: bool,
    requests: Vec<ApiRequest>,
}

#[derive(Default)]
struct FakeDisk {
    state: Mutex<State>,
}

fn json(code: u16, value: serde_json::Value) -> ApiResponse {
    ApiResponse::new(ResponseInfo::from_code(code), value.to_string().into_bytes())
}

fn empty(code: u16) -> ApiResponse {
    ApiResponse::new(ResponseInfo::from_code(code), Vec::new())
}

fn api_error(code: u16, error: &str, message: &str) -> ApiResponse {
    json(
        code,
        serde_json::json!({"error": error, "message": message, "description": message}),
    )
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Parse "bytes start-end/total" or "bytes */total"
fn parse_content_range(value: &str) -> Option<(Option<usize>, usize)> {
    let rest = value.strip_prefix("bytes ")?;
    let (range, total) = rest.split_once('/')?;
    let total = total.parse().ok()?;
    if range == "*" {
        return Some((None, total));
    }
    let (start, _) = range.split_once('-')?;
    Some((Some(start.parse().ok()?), total))
}

impl FakeDisk {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn put_file(&self, path: &str, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.files.insert(path.to_string(), data.to_vec());
    }

    fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(path).cloned()
    }

    fn interrupt_next_upload_after(&self, bytes: usize) {
        self.state.lock().unwrap().interrupt_after = Some(bytes);
    }

    fn hold_operations(&self) {
        self.state.lock().unwrap().hold_operations = true;
    }

    fn release_operations(&self) {
        let mut state = self.state.lock().unwrap();
        state.hold_operations = false;
        let ids: Vec<String> = state.staged.keys().cloned().collect();
        for id in ids {
            complete_if_ready(&mut state, &id);
        }
    }

    fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    fn transfer_requests_with_auth(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| !r.url.starts_with(API) && r.header_value("Authorization").is_some())
            .count()
    }

    fn handle_api(&self, state: &mut State, request: &ApiRequest, url: &Url) -> ApiResponse {
        let expected = format!("OAuth {TOKEN}");
        if request.header_value("Authorization") != Some(expected.as_str()) {
            return api_error(401, "UnauthorizedError", "Unauthorized");
        }

        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
        match segments.as_slice() {
            ["v1", "disk"] => json(
                200,
                serde_json::json!({
                    "total_space": 10_737_418_240u64,
                    "used_space": state.files.values().map(|f| f.len() as u64).sum::<u64>(),
                    "is_paid": false,
                    "system_folders": {"applications": "disk:/Applications"},
                }),
            ),
            ["v1", "disk", "resources", "upload"] => {
                let Some(path) = query_param(url, "path") else {
                    return api_error(400, "FieldValidationError", "path is required");
                };
                let overwrite = query_param(url, "overwrite").as_deref() == Some("true");
                if state.files.contains_key(&path) && !overwrite {
                    return api_error(
                        409,
                        "DiskResourceAlreadyExistsError",
                        "Resource already exists",
                    );
                }
                state.next_id += 1;
                let id = format!("op-{}", state.next_id);
                state.staged.insert(
                    id.clone(),
                    Staged {
                        path,
                        expected: None,
                        received: Vec::new(),
                    },
                );
                state
                    .operations
                    .insert(id.clone(), OperationState::InProgress);
                json(
                    200,
                    serde_json::json!({
                        "operation_id": id,
                        "href": format!("{UPLOADER}/upload/{id}"),
                        "method": "PUT",
                        "templated": false,
                    }),
                )
            }
            ["v1", "disk", "resources", "download"] => {
                let Some(path) = query_param(url, "path") else {
                    return api_error(400, "FieldValidationError", "path is required");
                };
                if !state.files.contains_key(&path) {
                    return api_error(404, "DiskNotFoundError", "Resource not found.");
                }
                let mut href = Url::parse(&format!("{DOWNLOADER}/download")).unwrap();
                href.query_pairs_mut().append_pair("path", &path);
                json(
                    200,
                    serde_json::json!({"href": href.as_str(), "method": "GET", "templated": false}),
                )
            }
            ["v1", "disk", "operations", id] => match state.operations.get(*id) {
                Some(status) => json(200, serde_json::json!({"status": status})),
                None => api_error(404, "NotFoundError", "Operation not found"),
            },
            _ => empty(404),
        }
    }

    fn handle_upload(
        &self,
        state: &mut State,
        request: &ApiRequest,
        url: &Url,
    ) -> Result<ApiResponse> {
        if request.method != HttpMethod::Put {
            return Ok(empty(405));
        }
        let id = url.path().trim_start_matches("/upload/").to_string();
        let interrupt = state.interrupt_after.take();
        let Some(staged) = state.staged.get_mut(&id) else {
            return Ok(empty(404));
        };

        match request.header_value("Content-Range") {
            None => {
                staged.expected = Some(request.body.len());
                staged.received.clear();
                if let Some(limit) = interrupt {
                    staged.received.extend_from_slice(&request.body[..limit]);
                    return Err(Error::Transport("connection reset by peer".into()));
                }
                staged.received.extend_from_slice(&request.body);
            }
            Some(value) => {
                let Some((start, total)) = parse_content_range(value) else {
                    return Ok(empty(400));
                };
                if let Some(start) = start {
                    if start != staged.received.len() {
                        return Ok(empty(412));
                    }
                }
                staged.expected = Some(total);
                staged.received.extend_from_slice(&request.body);
                if staged.received.len() > total {
                    return Ok(empty(413));
                }
            }
        }

        complete_if_ready(state, &id);
        Ok(empty(201))
    }

    fn handle_download(&self, state: &mut State, request: &ApiRequest, url: &Url) -> ApiResponse {
        let Some(path) = query_param(url, "path") else {
            return empty(400);
        };
        let Some(data) = state.files.get(&path) else {
            return empty(404);
        };
        match request
            .header_value("Range")
            .and_then(|r| r.strip_prefix("bytes="))
            .and_then(|r| r.strip_suffix('-'))
            .and_then(|r| r.parse::<usize>().ok())
        {
            Some(start) if start >= data.len() => empty(416),
            Some(start) => ApiResponse::new(ResponseInfo::from_code(206), data[start..].to_vec()),
            None => ApiResponse::new(ResponseInfo::from_code(200), data.clone()),
        }
    }
}

fn complete_if_ready(state: &mut State, id: &str) {
    if state.hold_operations {
        return;
    }
    let ready = state
        .staged
        .get(id)
        .is_some_and(|s| s.expected == Some(s.received.len()));
    if ready {
        if let Some(staged) = state.staged.remove(id) {
            state.files.insert(staged.path, staged.received);
            state
                .operations
                .insert(id.to_string(), OperationState::Success);
        }
    }
}

#[async_trait]
impl Transport for FakeDisk {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = Url::parse(&request.url).map_err(|e| Error::Transport(e.to_string()))?;
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());

        if request.url.starts_with(API) {
            Ok(self.handle_api(&mut state, &request, &url))
        } else if request.url.starts_with(UPLOADER) {
            self.handle_upload(&mut state, &request, &url)
        } else if request.url.starts_with(DOWNLOADER) {
            Ok(self.handle_download(&mut state, &request, &url))
        } else {
            Err(Error::Transport(format!("unknown host in {}", request.url)))
        }
    }
}

fn client(fake: &Arc<FakeDisk>) -> DiskClient {
    let config = ClientConfig::new(TOKEN).base_url(API);
    DiskClient::new(config, fake.clone()).unwrap()
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

#[tokio::test]
async fn test_upload_poll_download_one_million_bytes() {
    let fake = FakeDisk::new();
    let client = client(&fake);
    let canon = random_bytes(1_000_000);

    let link = client
        .resolve_upload_link("/app/test.txt", &[], true)
        .await
        .unwrap();
    let result = client.upload_full(&link, canon.clone()).await.unwrap();
    assert_eq!(result.bytes_transferred, 1_000_000);
    assert!(result.success);

    let status = client
        .get_operation_status(&link.operation_id, &[])
        .await
        .unwrap();
    assert_eq!(status.status, OperationState::Success);

    let download = client
        .resolve_download_link("/app/test.txt", &[])
        .await
        .unwrap();
    let data = client.download_full(&download).await.unwrap();
    assert_eq!(data.len(), 1_000_000);
    assert_eq!(data, canon);

    assert_eq!(fake.transfer_requests_with_auth(), 0);
}

#[tokio::test]
async fn test_resume_after_interrupted_upload() {
    let fake = FakeDisk::new();
    let client = client(&fake);
    let canon = random_bytes(250_000);
    let k = 100_000;

    let link = client
        .resolve_upload_link("disk:/big.bin", &[], true)
        .await
        .unwrap();

    fake.interrupt_next_upload_after(k);
    let err = client.upload_full(&link, canon.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_retryable());

    let status = client
        .get_operation_status(&link.operation_id, &[])
        .await
        .unwrap();
    assert_eq!(status.status, OperationState::InProgress);

    // Same link and operation, new exchange starting at the caller-tracked offset
    let result = client
        .upload_partial(&link, canon.clone(), k as u64)
        .await
        .unwrap();
    assert_eq!(result.bytes_transferred, (canon.len() - k) as u64);

    let status = client
        .get_operation_status(&link.operation_id, &[])
        .await
        .unwrap();
    assert_eq!(status.status, OperationState::Success);

    let stored = fake.file("disk:/big.bin").unwrap();
    assert_eq!(stored.len(), canon.len());
    assert_eq!(stored, canon);
}

#[tokio::test]
async fn test_resume_from_wrong_offset_is_rejected() {
    let fake = FakeDisk::new();
    let client = client(&fake);
    let canon = random_bytes(1000);

    let link = client
        .resolve_upload_link("/mismatch.bin", &[], true)
        .await
        .unwrap();
    fake.interrupt_next_upload_after(300);
    assert!(client.upload_full(&link, canon.clone()).await.is_err());

    let err = client
        .upload_partial(&link, canon, 500)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Client { .. }));
    assert_eq!(err.status_code(), Some(412));
}

#[tokio::test]
async fn test_offset_beyond_source_issues_no_request() {
    let fake = FakeDisk::new();
    let client = client(&fake);

    let link = client
        .resolve_upload_link("/small.bin", &[], true)
        .await
        .unwrap();
    let before = fake.request_count();

    let err = client
        .upload_partial(&link, vec![1, 2, 3], 4)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(fake.request_count(), before);
}

#[tokio::test]
async fn test_polling_is_idempotent_until_state_changes() {
    let fake = FakeDisk::new();
    let client = client(&fake);
    fake.hold_operations();

    let link = client
        .resolve_upload_link("/held.txt", &[], true)
        .await
        .unwrap();
    client.upload_full(&link, b"held".to_vec()).await.unwrap();

    let first = client
        .get_operation_status(&link.operation_id, &[])
        .await
        .unwrap();
    let second = client
        .get_operation_status(&link.operation_id, &[])
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.status, OperationState::InProgress);

    fake.release_operations();
    let third = client
        .get_operation_status(&link.operation_id, &[])
        .await
        .unwrap();
    assert_eq!(third.status, OperationState::Success);
}

#[tokio::test]
async fn test_upload_without_overwrite_conflicts() {
    let fake = FakeDisk::new();
    fake.put_file("/existing.txt", b"old");
    let client = client(&fake);

    let err = client
        .resolve_upload_link("/existing.txt", &[], false)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(409));
    assert!(!err.is_retryable());

    let link = client
        .resolve_upload_link("/existing.txt", &[], true)
        .await
        .unwrap();
    client.upload_full(&link, b"new".to_vec()).await.unwrap();
    assert_eq!(fake.file("/existing.txt").unwrap(), b"new");
}

#[tokio::test]
async fn test_ranged_download_and_sink() {
    let fake = FakeDisk::new();
    fake.put_file("/range.txt", b"0123456789");
    let client = client(&fake);

    let link = client
        .resolve_download_link("/range.txt", &[])
        .await
        .unwrap();
    assert_eq!(client.download_from(&link, 6).await.unwrap(), b"6789");

    let err = client.download_from(&link, 10).await.unwrap_err();
    assert_eq!(err.status_code(), Some(416));

    let mut sink: Vec<u8> = Vec::new();
    let result = client.download_to(&link, &mut sink).await.unwrap();
    assert_eq!(result.bytes_transferred, 10);
    assert_eq!(sink, b"0123456789");
}

#[tokio::test]
async fn test_download_missing_resource() {
    let fake = FakeDisk::new();
    let client = client(&fake);

    let err = client
        .resolve_download_link("/nope.txt", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Client { .. }));
    assert!(err.to_string().contains("DiskNotFoundError"));
}

#[tokio::test]
async fn test_invalid_token_is_rejected_by_service() {
    let fake = FakeDisk::new();
    let config = ClientConfig::new("AQA0AA00qEYz00WXA7olo").base_url(API);
    let client = DiskClient::new(config, fake.clone()).unwrap();

    let err = client.get_disk(&[]).await.unwrap_err();
    assert_eq!(err.status_code(), Some(401));
}

#[tokio::test]
async fn test_get_disk() {
    let fake = FakeDisk::new();
    fake.put_file("/a", &[0; 100]);
    let client = client(&fake);

    let disk = client.get_disk(&["is_paid"]).await.unwrap();
    assert!(!disk.is_paid);
    assert_eq!(disk.used_space, 100);
    assert_eq!(
        disk.system_folders.get("applications").map(String::as_str),
        Some("disk:/Applications")
    );
}
