use conductor_core::{ConductorError, ConductorResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Backoff configuration shared by all agents; the per-agent retry budget
/// lives on the descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Base delay in milliseconds for exponential backoff.
    pub backoff_base_ms: u64,
    /// Cap for the exponential delay, in milliseconds.
    pub backoff_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff_base_ms: 500,
            backoff_max_ms: 30_000,
        }
    }
}

/// Whether a failure is transient and worth retrying.
///
/// Deadline expiries and remote invocation failures are retryable;
/// validation, guardrail, and access errors are deterministic and are not.
pub fn is_retryable(err: &ConductorError) -> bool {
    matches!(
        err,
        ConductorError::AgentTimeout(_) | ConductorError::AgentInvocation(_)
    )
}

/// Exponential delay for the given attempt, capped at `backoff_max_ms`.
pub(crate) fn compute_backoff(policy: &RetryPolicy, attempt: u32) -> u64 {
    policy
        .backoff_base_ms
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(policy.backoff_max_ms)
}

/// Uniform jitter in `[0, base)`. Falls back to zero if the entropy source
/// is unavailable; a missing jitter must not fail the retry loop.
fn jitter_ms(base: u64) -> u64 {
    if base == 0 {
        return 0;
    }
    let mut buf = [0u8; 8];
    if getrandom::getrandom(&mut buf).is_err() {
        return 0;
    }
    u64::from_le_bytes(buf) % base
}

/// Upper bound on the wall-clock time one task can spend in the retry loop:
/// every attempt running to its deadline plus every backoff at maximum
/// jitter.
pub fn worst_case_budget(policy: &RetryPolicy, timeout: Duration, max_retries: u32) -> Duration {
    let mut budget = timeout * (max_retries + 1);
    for attempt in 0..max_retries {
        budget += Duration::from_millis(compute_backoff(policy, attempt) + policy.backoff_base_ms);
    }
    budget
}

/// Run `op` with bounded exponential backoff.
///
/// `op` receives the zero-based attempt number; `max_retries` is the number
/// of retries after the initial attempt. `classify` decides which failures
/// are transient — the loop itself is agent-agnostic. A non-retryable
/// failure aborts immediately; an exhausted budget surfaces as
/// [`ConductorError::RetriesExhausted`] carrying the final failure.
pub async fn retry_with_backoff<T, F, Fut, C>(
    policy: &RetryPolicy,
    max_retries: u32,
    classify: C,
    mut op: F,
) -> ConductorResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ConductorResult<T>>,
    C: Fn(&ConductorError) -> bool,
{
    let mut last_err: Option<ConductorError> = None;

    for attempt in 0..=max_retries {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !classify(&err) {
                    return Err(err);
                }
                if attempt < max_retries {
                    let delay = compute_backoff(policy, attempt) + jitter_ms(policy.backoff_base_ms);
                    info!(
                        attempt,
                        delay_ms = delay,
                        error = %err,
                        "retryable failure, backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                last_err = Some(err);
            }
        }
    }

    let last = last_err
        .unwrap_or_else(|| ConductorError::AgentInvocation("no attempt recorded".to_string()));
    if max_retries == 0 {
        Err(last)
    } else {
        Err(ConductorError::RetriesExhausted {
            attempts: max_retries + 1,
            last: Box::new(last),
        })
    }
}
