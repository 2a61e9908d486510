//! Bounded exponential backoff around a single backend call.
//!
//! The retry boundary is deliberately one idempotent completion call, never
//! a multi-call workflow: retrying a workflow duplicates the side effects
//! of the calls that already succeeded.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use stackforge_core::BackendError;

/// Retry transient backend failures with exponentially growing waits
/// clamped to `[min_delay, max_delay]`. Permanent failures and the final
/// transient failure propagate unchanged.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub async fn run<T, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.transient && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        op = op_name,
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        error = %err,
                        "transient backend failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// 4s, 8s, 10s, 10s: doubling from the floor, clamped at the ceiling.
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.min_delay.saturating_mul(factor).min(self.max_delay)
    }
}
