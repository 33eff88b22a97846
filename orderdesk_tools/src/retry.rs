//! Bounded exponential backoff for calls to the order-management service.
//!
//! The loop distinguishes two retry-worthy failures (rate limiting and transport errors) from permanent faults
//! (any other error status), which are surfaced immediately. Keeping the loop generic over the attempt outcome
//! means the budget arithmetic can be tested without a network.

use std::{future::Future, time::Duration};

use log::*;

use crate::OrderDeskApiError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: usize,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, backoff: Duration) -> Self {
        Self { max_retries, backoff }
    }

    /// Total attempt budget, i.e. the first try plus `max_retries` retries.
    pub fn attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// The wait before the retry following attempt `attempt` (0-based): `backoff * 2^attempt`.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.backoff * factor
    }
}

/// The result of a single request attempt, as seen by the retry loop.
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Success(T),
    /// The service answered with "too many requests". Retried with backoff.
    RateLimited,
    /// Any other error status. Not retried; likely a permanent fault.
    Failed { status: u16, message: String },
    /// Connection failure, timeout, etc. Retried with backoff.
    Transport(String),
}

/// Run `op` up to `policy.attempts()` times, sleeping `backoff * 2^attempt` between retry-worthy failures.
pub(crate) async fn execute_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, OrderDeskApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AttemptOutcome<T>>,
{
    let budget = policy.attempts();
    let mut last_transport_error = None;
    for attempt in 0..budget {
        match op().await {
            AttemptOutcome::Success(value) => return Ok(value),
            AttemptOutcome::Failed { status, message } => {
                debug!("Attempt {} failed with status {status}. Not retrying.", attempt + 1);
                return Err(OrderDeskApiError::QueryError { status, message });
            },
            AttemptOutcome::RateLimited => {
                if attempt + 1 == budget {
                    warn!("Rate limited on the final attempt. Giving up after {budget} attempts.");
                    return Err(OrderDeskApiError::RateLimitExceeded { attempts: budget });
                }
                let delay = policy.delay_for(attempt);
                debug!("Rate limited on attempt {}. Waiting {delay:?} before retrying.", attempt + 1);
                tokio::time::sleep(delay).await;
            },
            AttemptOutcome::Transport(e) => {
                if attempt + 1 == budget {
                    warn!("Transport error on the final attempt: {e}. Giving up after {budget} attempts.");
                    return Err(OrderDeskApiError::TransportError(e));
                }
                let delay = policy.delay_for(attempt);
                debug!("Transport error on attempt {}: {e}. Waiting {delay:?} before retrying.", attempt + 1);
                last_transport_error = Some(e);
                tokio::time::sleep(delay).await;
            },
        }
    }
    // The loop always returns on the final attempt; this is only reachable with a zero budget.
    Err(OrderDeskApiError::TransportError(last_transport_error.unwrap_or_else(|| "no attempts were made".into())))
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    fn policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::ZERO)
    }

    #[test]
    fn delays_grow_exponentially() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.attempts(), 4);
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn rate_limit_then_success_uses_two_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let result = execute_with_retry(&policy(2), move || {
            let c = c.clone();
            async move {
                match c.fetch_add(1, Ordering::SeqCst) {
                    0 => AttemptOutcome::RateLimited,
                    _ => AttemptOutcome::Success("payload"),
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "payload");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_rate_limits_raise_after_full_budget() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let result: Result<(), _> = execute_with_retry(&policy(2), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                AttemptOutcome::RateLimited
            }
        })
        .await;
        assert!(matches!(result, Err(OrderDeskApiError::RateLimitExceeded { attempts: 3 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn other_error_statuses_are_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let result: Result<(), _> = execute_with_retry(&policy(5), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                AttemptOutcome::Failed { status: 500, message: "boom".into() }
            }
        })
        .await;
        match result {
            Err(OrderDeskApiError::QueryError { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            },
            other => panic!("Expected QueryError, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_errors_are_retried_then_reraised() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let result: Result<(), _> = execute_with_retry(&policy(1), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                AttemptOutcome::Transport("connection refused".to_string())
            }
        })
        .await;
        match result {
            Err(OrderDeskApiError::TransportError(e)) => assert_eq!(e, "connection refused"),
            other => panic!("Expected TransportError, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_error_then_success_recovers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let result = execute_with_retry(&policy(2), move || {
            let c = c.clone();
            async move {
                match c.fetch_add(1, Ordering::SeqCst) {
                    0 => AttemptOutcome::Transport("timed out".to_string()),
                    _ => AttemptOutcome::Success(42),
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
