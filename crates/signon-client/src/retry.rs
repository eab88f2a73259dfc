// crates/signon-client/src/retry.rs
// ============================================================================
// Module: Retry and Cancellation
// Description: Exponential back-off bounded by an operation budget.
// Purpose: Absorb transient failures and eventual consistency in remote calls.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! [`retry`] re-runs a remote call while a caller-supplied classifier deems the
//! failure retryable. Delays start at [`RetryPolicy::initial_delay`], grow by
//! [`RetryPolicy::multiplier`] up to [`RetryPolicy::max_delay`], and stop once
//! the next wait would overrun [`RetryPolicy::budget`]. A [`CancelSignal`]
//! interrupts both the attempt loop and any pending back-off sleep.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::ClientError;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Back-off parameters for remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Growth factor applied after each retry.
    pub multiplier: u32,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Total time an operation may spend retrying.
    pub budget: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(30),
            budget: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Returns the delay following `current`.
    #[must_use]
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(self.multiplier.max(1)).min(self.max_delay)
    }
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Cloneable cooperative cancellation flag.
///
/// # Invariants
/// - Once cancelled, a signal stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    /// Shared flag; `true` once cancelled.
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    /// Creates a signal that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Cancels every clone of this signal.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Completes when the signal is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender outlives the receiver, so waiting cannot fail.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Fails with [`ClientError::Cancelled`] once cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cancelled`] when the signal has fired.
    pub fn check(&self) -> Result<(), ClientError> {
        if self.is_cancelled() { Err(ClientError::Cancelled) } else { Ok(()) }
    }
}

// ============================================================================
// SECTION: Retry Loop
// ============================================================================

/// Retry notification passed to observers before each back-off sleep.
#[derive(Debug)]
pub struct RetryAttempt<'a> {
    /// Attempt number that just failed (1-based).
    pub attempt: u32,
    /// Delay before the next attempt.
    pub delay: Duration,
    /// Failure that triggered the retry.
    pub error: &'a ClientError,
}

/// Runs `operation` until it succeeds, fails permanently, or the budget ends.
///
/// # Errors
///
/// Returns the first non-retryable failure, [`ClientError::Cancelled`] when
/// `cancel` fires, or [`ClientError::RetryBudgetExhausted`] wrapping the last
/// failure when the next back-off would exceed the budget.
pub async fn retry<T, Op, Fut, Classify, Observe>(
    policy: &RetryPolicy,
    cancel: &CancelSignal,
    mut retryable: Classify,
    mut observe: Observe,
    mut operation: Op,
) -> Result<T, ClientError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
    Classify: FnMut(&ClientError) -> bool,
    Observe: FnMut(&RetryAttempt<'_>),
{
    let started = Instant::now();
    let mut delay = policy.initial_delay;
    let mut attempts: u32 = 0;
    loop {
        cancel.check()?;
        attempts = attempts.saturating_add(1);
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        if matches!(error, ClientError::Cancelled) || !retryable(&error) {
            return Err(error);
        }
        if started.elapsed().saturating_add(delay) > policy.budget {
            return Err(ClientError::RetryBudgetExhausted {
                attempts,
                last: Box::new(error),
            });
        }
        observe(&RetryAttempt {
            attempt: attempts,
            delay,
            error: &error,
        });
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
        }
        delay = policy.next_delay(delay);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use super::*;

    fn unavailable() -> ClientError {
        ClientError::from_response(503, b"")
    }

    #[test]
    fn delays_grow_to_the_cap() {
        let policy = RetryPolicy::default();
        let mut delay = policy.initial_delay;
        let mut seen = Vec::new();
        for _ in 0 .. 7 {
            seen.push(delay.as_secs());
            delay = policy.next_delay(delay);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 30, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let mut observed = Vec::new();
        let result = retry(
            &RetryPolicy::default(),
            &CancelSignal::new(),
            ClientError::is_transient,
            |attempt| observed.push(attempt.delay),
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 { Err(unavailable()) } else { Ok(7) }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(observed, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failures_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), ClientError> = retry(
            &RetryPolicy::default(),
            &CancelSignal::new(),
            ClientError::is_transient,
            |_| {},
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::from_response(400, b""))
            },
        )
        .await;
        assert_eq!(result.unwrap_err().status(), Some(400));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_exhaustion_wraps_last_failure() {
        let policy = RetryPolicy {
            budget: Duration::from_secs(10),
            ..RetryPolicy::default()
        };
        let result: Result<(), ClientError> = retry(
            &policy,
            &CancelSignal::new(),
            ClientError::is_transient,
            |_| {},
            || async { Err(unavailable()) },
        )
        .await;
        // Waits of 1 + 2 + 4 fit; the next 8 s wait would overrun 10 s.
        match result.unwrap_err() {
            ClientError::RetryBudgetExhausted {
                attempts,
                last,
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(last.status(), Some(503));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let cancel = CancelSignal::new();
        let trigger = cancel.clone();
        let result: Result<(), ClientError> = retry(
            &RetryPolicy::default(),
            &cancel,
            ClientError::is_transient,
            |_| trigger.cancel(),
            || async { Err(unavailable()) },
        )
        .await;
        assert_eq!(result.unwrap_err(), ClientError::Cancelled);
    }

    #[tokio::test]
    async fn cancelled_signal_is_sticky_across_clones() {
        let cancel = CancelSignal::new();
        let clone = cancel.clone();
        assert!(clone.check().is_ok());
        cancel.cancel();
        assert!(clone.is_cancelled());
        clone.cancelled().await;
        assert_eq!(clone.check(), Err(ClientError::Cancelled));
    }
}
