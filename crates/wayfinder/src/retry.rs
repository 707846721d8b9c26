//! Bounded retries for interactions and fixed-attempt checks.

use crate::result::WayfinderResult;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default pause before retrying an interaction (150ms)
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 150;

/// Attempts made by the page title check
pub const TITLE_ATTEMPTS: u32 = 3;

/// Pause between page title attempts (300ms)
pub const TITLE_ATTEMPT_INTERVAL_MS: u64 = 300;

/// Retry behavior for an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    /// Pause before each retry
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RetryPolicy {
    /// Create a policy with the default backoff
    #[must_use]
    pub const fn new(retries: u32) -> Self {
        Self {
            retries,
            backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }

    /// Set the backoff
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts the policy allows
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Run `attempt`, retrying retryable failures.
    ///
    /// Before each retry the policy sleeps for the backoff and runs
    /// `recover`. A failing `recover` is logged and the retry goes ahead.
    /// Errors that are not [retryable](crate::WayfinderError::is_retryable)
    /// are returned at once.
    pub async fn run<T, A, AFut, R, RFut>(
        &self,
        action: &str,
        mut attempt: A,
        mut recover: R,
    ) -> WayfinderResult<T>
    where
        A: FnMut() -> AFut,
        AFut: Future<Output = WayfinderResult<T>>,
        R: FnMut() -> RFut,
        RFut: Future<Output = WayfinderResult<()>>,
    {
        let mut remaining = self.retries;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if remaining > 0 && err.is_retryable() => {
                    warn!(action, remaining, error = %err, "retrying");
                    remaining -= 1;
                    tokio::time::sleep(self.backoff).await;
                    if let Err(recover_err) = recover().await {
                        debug!(action, error = %recover_err, "recovery before retry failed");
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Outcome of one check attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Check passed
    Pass,
    /// Check failed with message
    Fail(String),
}

impl CheckOutcome {
    /// Check if the outcome is a pass
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// A check made a fixed number of times at a fixed interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAttempts {
    /// Number of attempts
    pub attempts: u32,
    /// Pause between attempts
    pub interval: Duration,
}

impl FixedAttempts {
    /// The page title check: 3 attempts, 300ms apart
    pub const TITLE: Self = Self {
        attempts: TITLE_ATTEMPTS,
        interval: Duration::from_millis(TITLE_ATTEMPT_INTERVAL_MS),
    };

    /// Run `check` until it passes or the attempts run out.
    ///
    /// Returns the last outcome; driver errors abort at once.
    pub async fn run<F, Fut>(&self, mut check: F) -> WayfinderResult<CheckOutcome>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = WayfinderResult<CheckOutcome>>,
    {
        let mut outcome = check().await?;
        for _ in 1..self.attempts {
            if outcome.is_pass() {
                break;
            }
            tokio::time::sleep(self.interval).await;
            outcome = check().await?;
        }
        Ok(outcome)
    }
}
