//! Push a change-set to the webhook in fixed-size batches.
//!
//! Each batch is retried independently. A batch that never succeeds is
//! dropped and the run moves on; the caller gets back how many rows landed.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use super::reconcile::ChangeSet;
use super::row::CanonicalRow;
use super::transport::{SheetTransport, TransportResponse};
use crate::error::PipelineError;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub batch_size: usize,
    /// Attempts per batch, including the first.
    pub retries: u32,
    pub retry_delay: Duration,
    /// Stop dispatching once this instant has passed.
    pub deadline: Option<Instant>,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Rows in batches the webhook accepted.
    pub delivered: usize,
    pub batches_delivered: usize,
    pub batches_dropped: usize,
    /// Batches never attempted because the deadline passed.
    pub batches_skipped: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum BatchResult {
    Delivered,
    Dropped,
    DeadlineExceeded,
}

#[derive(Serialize)]
struct BatchPayload<'a> {
    data: Vec<&'a CanonicalRow>,
}

/// Send `changes` to `endpoint`, returning delivered-row accounting.
pub async fn dispatch<T: SheetTransport + ?Sized>(
    transport: &T,
    endpoint: &str,
    changes: &ChangeSet,
    policy: &DispatchPolicy,
) -> DispatchOutcome {
    let rows: Vec<&CanonicalRow> = changes.rows().collect();
    let batch_size = policy.batch_size.max(1);
    let total_batches = rows.len().div_ceil(batch_size);
    let mut outcome = DispatchOutcome::default();

    for (idx, batch) in rows.chunks(batch_size).enumerate() {
        if deadline_passed(policy.deadline) {
            outcome.batches_skipped = total_batches - idx;
            log::error!(
                "Sheet sync: run deadline reached, {} batches not sent",
                outcome.batches_skipped
            );
            break;
        }

        match post_batch(transport, endpoint, batch, policy).await {
            BatchResult::Delivered => {
                outcome.delivered += batch.len();
                outcome.batches_delivered += 1;
            }
            BatchResult::Dropped => {
                outcome.batches_dropped += 1;
                log::error!(
                    "Sheet sync: batch {}/{} ({} rows) dropped",
                    idx + 1,
                    total_batches,
                    batch.len()
                );
            }
            BatchResult::DeadlineExceeded => {
                outcome.batches_dropped += 1;
                outcome.batches_skipped = total_batches - idx - 1;
                log::error!(
                    "Sheet sync: run deadline reached during batch {}/{}, {} later batches not sent",
                    idx + 1,
                    total_batches,
                    outcome.batches_skipped
                );
                break;
            }
        }
    }

    outcome
}

async fn post_batch<T: SheetTransport + ?Sized>(
    transport: &T,
    endpoint: &str,
    batch: &[&CanonicalRow],
    policy: &DispatchPolicy,
) -> BatchResult {
    if batch.is_empty() {
        return BatchResult::Delivered;
    }

    let payload = match serde_json::to_string(&BatchPayload {
        data: batch.to_vec(),
    }) {
        Ok(p) => p,
        Err(e) => {
            log::error!("Sheet sync: failed to encode batch: {}", e);
            return BatchResult::Dropped;
        }
    };

    let attempts = policy.retries.max(1);
    for attempt in 1..=attempts {
        let result = transport
            .post_json(endpoint, payload.clone())
            .await
            .and_then(|resp| {
                log::debug!(
                    "Sheet sync: POST attempt {} status={} size={}",
                    attempt,
                    resp.status,
                    payload.len()
                );
                check_response(&resp)
            });
        match result {
            Ok(()) => {
                log::info!("Sheet sync: batch ({}) synced", batch.len());
                return BatchResult::Delivered;
            }
            Err(e) if !e.is_retryable() => {
                log::error!("Sheet sync: POST attempt {} failed permanently: {}", attempt, e);
                return BatchResult::Dropped;
            }
            Err(e) => log::warn!("Sheet sync: POST attempt {} failed: {}", attempt, e),
        }

        if attempt < attempts && !wait_before_retry(policy).await {
            return BatchResult::DeadlineExceeded;
        }
    }

    BatchResult::Dropped
}

/// A delivery counts only when the status is 200 and the body does not carry
/// an Apps Script `{"status": "error"}` marker. Non-JSON bodies are accepted.
fn check_response(resp: &TransportResponse) -> Result<(), PipelineError> {
    if resp.status != 200 {
        return Err(PipelineError::HttpStatus {
            status: resp.status,
            body: resp.body.chars().take(200).collect(),
        });
    }
    let Ok(body) = serde_json::from_str::<serde_json::Value>(&resp.body) else {
        return Ok(());
    };
    if body.get("status").and_then(|s| s.as_str()) == Some("error") {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("no message");
        return Err(PipelineError::Rejected(message.to_string()));
    }
    Ok(())
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Sleep the retry delay. Returns false, without sleeping past it, when the
/// deadline falls inside the wait.
async fn wait_before_retry(policy: &DispatchPolicy) -> bool {
    let wake = Instant::now() + policy.retry_delay;
    match policy.deadline {
        Some(deadline) if deadline <= wake => {
            tokio::time::sleep_until(deadline).await;
            false
        }
        _ => {
            tokio::time::sleep_until(wake).await;
            true
        }
    }
}
