//! Bounded-retry polling for eventually-consistent conditions.
//!
//! A probe reports one of three outcomes per attempt. Only a
//!  definitive failure or running out of attempts ends a poll
//!  negatively; a record the index has not observed yet is just
//!  another attempt.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{FailureReason, OperationError};

/// Outcome of a single probe attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Satisfied(T),
    /// The downstream system has not caught up yet; keep polling
    NotYetVisible,
    /// Stop now, the condition can never be satisfied
    Failed(FailureReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const fn new(interval_ms: u64, max_attempts: u32) -> Self {
        Self {
            interval_ms,
            max_attempts,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Total time spent waiting if every attempt comes back not-yet-visible
    pub fn budget(&self) -> Duration {
        self.interval() * self.max_attempts.saturating_sub(1)
    }
}

/// Per-use polling windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicies {
    /// Provider countersigning a storage request on the ledger (~30s)
    #[serde(default = "default_confirmation")]
    pub confirmation: PollPolicy,
    /// A fresh bucket showing up in the index (~1m)
    #[serde(default = "default_index_visibility")]
    pub index_visibility: PollPolicy,
    /// An uploaded file leaving `pending` (~5m)
    #[serde(default = "default_readiness")]
    pub readiness: PollPolicy,
    /// Background tracking of a deletion (~10m, best effort)
    #[serde(default = "default_deletion")]
    pub deletion: PollPolicy,
}

fn default_confirmation() -> PollPolicy {
    PollPolicy::new(1_000, 30)
}

fn default_index_visibility() -> PollPolicy {
    PollPolicy::new(2_000, 30)
}

fn default_readiness() -> PollPolicy {
    PollPolicy::new(2_000, 150)
}

fn default_deletion() -> PollPolicy {
    PollPolicy::new(5_000, 120)
}

impl Default for PollPolicies {
    fn default() -> Self {
        Self {
            confirmation: default_confirmation(),
            index_visibility: default_index_visibility(),
            readiness: default_readiness(),
            deletion: default_deletion(),
        }
    }
}

/// Run `probe` until it is satisfied, fails definitively, runs out of
///  attempts or `cancel` fires.
///
/// The first probe runs immediately; `policy.interval()` separates
///  consecutive probes. Errors returned by the probe itself are
///  propagated unchanged. A cancelled poll never reports success:
///  an attempt already in flight is allowed to finish but its result
///  is dropped.
pub async fn poll_until<T, F, Fut>(
    operation: &str,
    policy: PollPolicy,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<T, OperationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe<T>, OperationError>>,
{
    let cancelled = || OperationError::Cancelled {
        operation: operation.to_string(),
    };

    for attempt in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let outcome = probe().await?;
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        match outcome {
            Probe::Satisfied(value) => {
                tracing::debug!(operation, attempt, "poll satisfied");
                return Ok(value);
            }
            Probe::Failed(reason) => {
                tracing::warn!(operation, attempt, reason = reason.as_str(), "poll failed definitively");
                return Err(OperationError::DefinitivelyFailed(reason));
            }
            Probe::NotYetVisible => {
                tracing::debug!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts,
                    "not yet visible"
                );
            }
        }

        if attempt < policy.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = tokio::time::sleep(policy.interval()) => {}
            }
        }
    }

    Err(OperationError::Timeout {
        operation: operation.to_string(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use tokio::time::Instant;

    const POLICY: PollPolicy = PollPolicy::new(100, 5);

    #[tokio::test(start_paused = true)]
    async fn test_satisfied_after_n_misses() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let value = poll_until("test", POLICY, &CancellationToken::new(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Ok(Probe::NotYetVisible)
                } else {
                    Ok(Probe::Satisfied(n))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let err = poll_until::<(), _, _>("index", POLICY, &CancellationToken::new(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(Probe::NotYetVisible) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, OperationError::Timeout { attempts: 5, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_definitive_failure_stops_immediately() {
        let calls = AtomicU32::new(0);

        let err = poll_until::<(), _, _>("ready", POLICY, &CancellationToken::new(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 1 {
                    Ok(Probe::Failed(FailureReason::Rejected))
                } else {
                    Ok(Probe::NotYetVisible)
                }
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            OperationError::DefinitivelyFailed(FailureReason::Rejected)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_propagates() {
        let err = poll_until::<(), _, _>("x", POLICY, &CancellationToken::new(), || async {
            Err(OperationError::AuthExpired)
        })
        .await
        .unwrap_err();
        assert!(err.is_auth_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_between_attempts() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let task = {
            let cancel = cancel.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                poll_until::<(), _, _>("deletion", PollPolicy::new(1_000, 100), &cancel, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Probe::NotYetVisible) }
                })
                .await
            })
        };

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        cancel.cancel();
        let err = task.await.unwrap().unwrap_err();

        assert!(matches!(err, OperationError::Cancelled { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_already_cancelled_never_probes() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = AtomicU32::new(0);

        let err = poll_until::<(), _, _>("x", POLICY, &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(Probe::Satisfied(())) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, OperationError::Cancelled { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_budget() {
        assert_eq!(POLICY.budget(), Duration::from_millis(400));
        assert_eq!(PollPolicies::default().readiness.budget().as_secs(), 298);
    }
}
