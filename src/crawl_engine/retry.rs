//! Per-stage retry with failure accounting.
//!
//! Every stage runs through [`run_stage`]: a fixed attempt budget, a short
//! fixed backoff, and exactly one `total_calls` increment per invocation.
//! Entity-local failures never escape; they are counted and the caller gets
//! `None`. Only run-level errors are returned as `Err`.

use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;

use super::crawl_types::{CrawlResult, Stage, StageOutcome};
use super::run_stats::RunStats;

/// Attempt budget and backoff for one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u8,
    pub backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(attempts: u8, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }
}

/// Run `attempt` until it succeeds, skips, or exhausts `policy`.
///
/// Each attempt must own and release its own session resources; a failed
/// attempt is retried from scratch.
///
/// Returns:
/// * `Ok(Some(value))` when an attempt produced a value
/// * `Ok(None)` when the entity was skipped (not counted as a failure) or
///   when every attempt failed (counted once under `stage`)
/// * `Err` only for run-level errors, which abort the run immediately
pub async fn run_stage<T, F, Fut>(
    stats: &RunStats,
    stage: Stage,
    policy: RetryPolicy,
    label: &str,
    mut attempt: F,
) -> CrawlResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CrawlResult<StageOutcome<T>>>,
{
    stats.record_call(stage);

    let mut attempt_no: u8 = 0;
    loop {
        attempt_no += 1;

        match attempt().await {
            Ok(StageOutcome::Done(value)) => {
                if attempt_no > 1 {
                    debug!("{stage} {label} succeeded on attempt {attempt_no}");
                }
                return Ok(Some(value));
            }
            Ok(StageOutcome::Skipped(reason)) => {
                info!("{stage} {label} skipped: {reason}");
                return Ok(None);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) if attempt_no < policy.attempts => {
                warn!(
                    "{stage} {label} attempt {attempt_no}/{} failed: {e}",
                    policy.attempts
                );
                if !policy.backoff.is_zero() {
                    tokio::time::sleep(policy.backoff).await;
                }
            }
            Err(e) => {
                warn!(
                    "{stage} {label} failed after {} attempts: {e}",
                    policy.attempts
                );
                stats.record_failure(stage, &e);
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl_engine::CrawlError;
    use std::sync::atomic::{AtomicU8, Ordering};

    fn policy(attempts: u8) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let stats = RunStats::new();
        let calls = AtomicU8::new(0);

        let result = run_stage(&stats, Stage::City, policy(3), "city-a", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(CrawlError::navigation("flaky"))
                } else {
                    Ok(StageOutcome::Done(n))
                }
            }
        })
        .await
        .expect("not fatal");

        assert_eq!(result, Some(2));
        let city = stats.snapshot().stage(Stage::City);
        assert_eq!((city.total_calls, city.failed_calls), (1, 0));
    }

    #[tokio::test]
    async fn exhausted_budget_counts_one_failure() {
        let stats = RunStats::new();
        let calls = AtomicU8::new(0);

        let result: Option<()> = run_stage(&stats, Stage::Community, policy(2), "c", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CrawlError::navigation("down")) }
        })
        .await
        .expect("not fatal");

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let community = stats.snapshot().stage(Stage::Community);
        assert_eq!((community.total_calls, community.failed_calls), (1, 1));
    }

    #[tokio::test]
    async fn skip_is_neither_retried_nor_counted() {
        let stats = RunStats::new();
        let calls = AtomicU8::new(0);

        let result: Option<()> = run_stage(&stats, Stage::City, policy(3), "404", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(StageOutcome::Skipped("not found".into())) }
        })
        .await
        .expect("not fatal");

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(stats.snapshot().stage(Stage::City).failed_calls, 0);
    }

    #[tokio::test]
    async fn fatal_error_aborts_without_retry() {
        let stats = RunStats::new();
        let calls = AtomicU8::new(0);

        let result: CrawlResult<Option<()>> =
            run_stage(&stats, Stage::City, policy(3), "gate", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CrawlError::GateClosed) }
            })
            .await;

        assert!(matches!(result, Err(CrawlError::GateClosed)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
