//! Exponential backoff for flaky HTTP collaborators

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::Result;

/// Retry settings shared by the HTTP providers
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub base_delay: Duration,
    /// Ceiling on any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Delay before retry number `attempt + 1`, capped at `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Run `operation` until it succeeds or retries run out, returning the last error
    pub async fn run<F, Fut, T>(&self, what: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what,
                        attempt + 1,
                        self.max_retries.saturating_add(1),
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
