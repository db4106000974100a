//! Bounded retry for transient transport failures
//!
//! The status-query call gets a narrow retry policy (a handful of
//! attempts with a short fixed delay) before its error is classified as
//! fatal. The helper is generic over the error type via [`IsRetryable`]
//! so tests can drive it with their own error enums.

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, connection resets, remote 5xx)
/// should return `true`. Permanent failures (bad configuration, corrupt
/// data) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Any transport failure on a status query is worth another
            // attempt: timeouts, connect errors, and remote 5xx alike
            Error::Network(_) => true,
            // I/O errors can be retryable in some cases
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            // Config errors are permanent
            Error::Config { .. } => false,
            // Poll exhaustion is terminal by definition
            Error::Poll(_) => false,
            // Extraction and serialization errors are permanent
            Error::Extraction(_) => false,
            Error::Serialization(_) => false,
        }
    }
}

/// Execute an async operation with bounded retries
///
/// Attempts the operation up to `config.max_attempts` times in total,
/// sleeping between attempts. With `backoff_multiplier` at 1.0 the
/// delay stays fixed; larger multipliers grow it exponentially up to
/// `config.max_delay`.
///
/// # Arguments
///
/// * `config` - Retry configuration (attempt count, delays, jitter)
/// * `operation` - Async closure returning `Result<T, E>` where `E`
///   implements [`IsRetryable`]
///
/// # Returns
///
/// The first successful result, or the last error once the attempts are
/// exhausted or a non-retryable error surfaces.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt: u32 = 1;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying"
                );

                let jittered_delay = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(jittered_delay).await;

                delay = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
                    .min(config.max_delay);
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay,
/// so the actual delay falls between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
