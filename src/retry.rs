//! Plain retry for transient failures.
//!
//! Separate from the challenge flow: this decorator re-runs whole operations
//! when the failure was a network drop or a server-side error, and never
//! retries anything a resend cannot fix.

use std::future::Future;
use std::time::Duration;

use log::debug;
use rand::Rng;
use tokio::time::sleep;

use crate::outcome::classify;
use crate::transport::ApiFailure;

/// Controls how often and how fast transient failures are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt, so `3` allows four attempts total.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Random spread applied to each delay, as a fraction of the delay.
    pub jitter: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    // Delay before the retry that follows zero-based failure `attempt`.
    // Grows linearly so the waits read 1x, 2x, 3x the base.
    fn backoff(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_secs_f32() * (attempt + 1) as f32;
        if self.jitter <= 0.0 {
            return Duration::from_secs_f32(scaled);
        }
        let mut rng = rand::thread_rng();
        let spread = self.jitter.min(1.0);
        Duration::from_secs_f32(scaled * rng.gen_range(1.0 - spread..=1.0 + spread))
    }
}

/// Runs `operation` until it succeeds, fails in a way a resend cannot fix,
/// or the retry budget runs out.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, ApiFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiFailure>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(failure) => {
                if attempt >= policy.max_retries || !classify(&failure).is_retryable() {
                    return Err(failure);
                }
                let wait = policy.backoff(attempt);
                debug!("transient failure, retrying in {wait:?}: {failure}");
                sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
