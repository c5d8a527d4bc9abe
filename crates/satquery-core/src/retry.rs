//! Retry policy and non-throwing execution helpers.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::ApiError;

/// Backoff strategy applied between attempts of one logical call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Waits `delay * attempt` after the n-th failed attempt.
    Linear {
        /// Base delay multiplied by the attempt number.
        delay: Duration,
    },
    /// Waits `base * (factor ^ (attempt - 1))`, capped at `max`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent attempt.
        factor: f64,
        /// The maximum duration to wait between attempts.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(200),
            factor: 2.0,
            max: Duration::from_secs(3),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Linear { delay } => delay.saturating_mul(attempt.max(1)),
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt.saturating_sub(1) as i32);
                let seconds = base.as_secs_f64() * scale;
                let capped_seconds = seconds.min(max.as_secs_f64());

                let mut delay = Duration::from_secs_f64(capped_seconds);

                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// Runs `op` up to `max_attempts` times.
///
/// Non-retryable errors (client-range HTTP statuses, envelope rejections,
/// decode and validation failures) stop the loop immediately; transient
/// errors sleep per `backoff` before the next attempt. The last error is
/// returned once attempts are exhausted.
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff: Backoff,
    mut op: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = max_attempts.max(1);

    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !error.is_retryable() || attempt >= max_attempts {
                    return Err(error);
                }

                let delay = backoff.delay(attempt);
                debug!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    code = error.code(),
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Discards the error path entirely, substituting a caller-provided default.
pub async fn with_default<T, Fut>(fut: Fut, default: T) -> T
where
    Fut: Future<Output = Result<T, ApiError>>,
{
    fut.await.unwrap_or(default)
}

/// Runs all operations concurrently and returns their outcomes aligned with
/// the input positions. No failure aborts a sibling operation.
pub async fn settle_all<T, Fut>(futures: Vec<Fut>) -> Vec<Result<T, ApiError>>
where
    Fut: Future<Output = Result<T, ApiError>>,
{
    futures::future::join_all(futures).await
}

/// Splits settled outcomes into (errors, values), both in declaration order,
/// dropping the slot correspondence. Consumers that need positional
/// alignment use [`settle_all`] directly instead.
pub fn partition_settled<T>(settled: Vec<Result<T, ApiError>>) -> (Vec<ApiError>, Vec<T>) {
    let mut errors = Vec::new();
    let mut values = Vec::new();
    for outcome in settled {
        match outcome {
            Ok(value) => values.push(value),
            Err(error) => errors.push(error),
        }
    }
    (errors, values)
}
