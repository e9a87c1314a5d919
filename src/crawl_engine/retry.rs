//! Bounded exponential-backoff retry for store operations
//!
//! A [`RetryPolicy`] is an explicit collaborator: callers that persist
//! through the store hold one and wrap each store call in [`RetryPolicy::run`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use super::crawl_types::HarvestError;
use crate::store::StoreError;
use crate::utils::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MILLIS};

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

impl Retryable for HarvestError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

/// Retry schedule: at most `max_attempts` calls, sleeping `base_delay * 2^i`
/// after the i-th (0-indexed) failed call. No jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETRY_ATTEMPTS,
            Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MILLIS),
        )
    }
}

impl RetryPolicy {
    /// `max_attempts` below 1 is treated as 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Backoff slept after failed attempt `attempt` (0-indexed)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds, fails fatally, or attempts run out.
    ///
    /// Fatal errors are returned after the first call. When every attempt
    /// fails transiently the last error is returned.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{label} succeeded after {} attempts", attempt + 1);
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt + 1 >= self.max_attempts => {
                    warn!(
                        "{label} failed after {} attempts: {e}",
                        self.max_attempts
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{label} failed, retrying in {}ms ({}/{}): {e}",
                        delay.as_millis(),
                        attempt + 1,
                        self.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
