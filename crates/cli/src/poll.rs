//! Waiting on asynchronous operations
//!
//! The client only ever takes one status snapshot. Repeating the query until
//! the operation settles is the caller's job, done here with exponential
//! backoff.

use std::time::Duration;

use yd_core::{DiskApi, Error, OperationStatus, PollConfig, Result};

/// Query an operation until it reaches a terminal state
///
/// The first query is sent immediately. Later queries wait
/// `initial_backoff_ms`, doubling each time up to `max_backoff_ms`.
/// Retryable errors (5xx, 429, timeouts) count as an attempt and are retried;
/// anything else is returned at once. Running out of attempts while the
/// operation is still in progress is a timeout.
///
/// `on_poll` sees every snapshot, terminal or not.
pub async fn wait_for_operation(
    api: &dyn DiskApi,
    operation_id: &str,
    fields: &[&str],
    poll: &PollConfig,
    mut on_poll: impl FnMut(u32, &OperationStatus),
) -> Result<OperationStatus> {
    let max_attempts = poll.max_attempts.max(1);
    let max_backoff = Duration::from_millis(poll.max_backoff_ms);
    let mut delay = Duration::from_millis(poll.initial_backoff_ms).min(max_backoff);

    for attempt in 1..=max_attempts {
        match api.get_operation_status(operation_id, fields).await {
            Ok(status) => {
                on_poll(attempt, &status);
                if status.is_terminal() {
                    tracing::debug!(operation_id, attempt, status = %status.status, "operation settled");
                    return Ok(status);
                }
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!(operation_id, attempt, error = %e, "status query failed, retrying");
            }
            Err(e) => return Err(e),
        }

        if attempt < max_attempts {
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(max_backoff);
        }
    }

    Err(Error::Timeout(format!(
        "operation {operation_id} still in progress after {max_attempts} status queries"
    )))
}
