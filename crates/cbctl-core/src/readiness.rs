//! Bucket readiness polling
//!
//! Bucket creation completes on the cluster after the create request returns.
//! [`wait_ready`] polls the bucket's configuration until every node serving it
//! reports `healthy`, or the caller's deadline passes.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::bucket::BucketInfo;
use crate::client::AdminClient;
use crate::error::{AdminError, Result};

/// Default time between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Polls are never issued closer together than this
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default readiness deadline used by the CLI
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Progress events emitted while waiting for a bucket
#[derive(Debug, Clone, PartialEq)]
pub enum ReadinessEvent {
    /// Polling has begun
    Started { bucket: String, timeout: Duration },
    /// About to query the bucket
    Polling {
        bucket: String,
        attempt: u32,
        elapsed: Duration,
    },
    /// The bucket exists but is not serving yet, or could not be queried
    NotYetAvailable { bucket: String, reason: String },
    /// Every node reports healthy
    Ready { bucket: String, elapsed: Duration },
    /// The deadline passed
    TimedOut { bucket: String, elapsed: Duration },
}

/// Callback type for readiness updates.
///
/// The CLI uses this to drive its spinner.
pub type ReadinessCallback = Box<dyn Fn(ReadinessEvent) + Send + Sync>;

/// Poll `bucket` until it is ready or `timeout` elapses.
///
/// `interval` is clamped to [`MIN_POLL_INTERVAL`]. Each attempt is bounded by
/// the time remaining, so the call returns close to the deadline even when the
/// cluster stalls. HTTP and network failures count as "not ready yet";
/// argument and authentication errors end the wait immediately.
///
/// Dropping the returned future cancels the wait.
pub async fn wait_ready(
    client: &AdminClient,
    bucket: &str,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ReadinessCallback>,
) -> Result<BucketInfo> {
    if bucket.trim().is_empty() {
        return Err(AdminError::argument("bucket name must not be empty"));
    }
    let interval = interval.max(MIN_POLL_INTERVAL);
    let start = Instant::now();
    let mut attempt = 0u32;
    let mut last_error: Option<String> = None;

    debug!(
        "Waiting up to {:?} for bucket '{}' (interval {:?})",
        timeout, bucket, interval
    );
    emit(
        &on_progress,
        ReadinessEvent::Started {
            bucket: bucket.to_string(),
            timeout,
        },
    );

    loop {
        let elapsed = start.elapsed();
        let remaining = timeout.saturating_sub(elapsed);
        if remaining.is_zero() {
            break;
        }

        attempt += 1;
        emit(
            &on_progress,
            ReadinessEvent::Polling {
                bucket: bucket.to_string(),
                attempt,
                elapsed,
            },
        );

        let reason = match tokio::time::timeout(remaining, client.bucket_info(bucket)).await {
            Ok(Ok(info)) if info.is_ready() => {
                let elapsed = start.elapsed();
                debug!("Bucket '{}' ready after {:?}", bucket, elapsed);
                emit(
                    &on_progress,
                    ReadinessEvent::Ready {
                        bucket: bucket.to_string(),
                        elapsed,
                    },
                );
                return Ok(info);
            }
            Ok(Ok(info)) => info.health_summary(),
            Ok(Err(e)) if e.is_argument() || e.is_auth() => return Err(e),
            Ok(Err(e)) => e.to_string(),
            Err(_) => "status request did not complete before the deadline".to_string(),
        };

        trace!("Bucket '{}' attempt {}: {}", bucket, attempt, reason);
        emit(
            &on_progress,
            ReadinessEvent::NotYetAvailable {
                bucket: bucket.to_string(),
                reason: reason.clone(),
            },
        );
        last_error = Some(reason);

        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            break;
        }
        tokio::time::sleep(interval.min(remaining)).await;
    }

    let elapsed = start.elapsed();
    emit(
        &on_progress,
        ReadinessEvent::TimedOut {
            bucket: bucket.to_string(),
            elapsed,
        },
    );
    Err(AdminError::Timeout {
        bucket: bucket.to_string(),
        timeout,
        last_error,
    })
}

fn emit(callback: &Option<ReadinessCallback>, event: ReadinessEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
