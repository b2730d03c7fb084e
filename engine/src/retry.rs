//! Retry policy for outbound calls.
//!
//! - Max retries: 2 (3 total attempts)
//! - Initial delay: 500ms, doubling per attempt
//! - Max delay: 8 seconds
//! - Jitter: down-jitter up to 25% (multiplier in [0.75, 1.0])
//!
//! Only [`SinkError::Unavailable`] is retried.

use std::future::Future;
use std::time::Duration;

use crate::sink::SinkError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting the first attempt).
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Down-jitter factor (0.25 = up to 25% shorter).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}

/// Backoff before retry number `backoff_step + 1`.
#[must_use]
pub fn calculate_retry_delay(backoff_step: u32, config: &RetryConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step.min(31) as i32);
    let capped = base.min(config.max_delay.as_secs_f64());
    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
pub async fn with_retry<T, F, Fut>(
    operation: &'static str,
    config: &RetryConfig,
    mut op: F,
) -> Result<T, SinkError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SinkError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < config.max_retries => {
                let delay = calculate_retry_delay(attempt, config);
                attempt += 1;
                tracing::debug!(
                    operation,
                    retry_count = attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying after {err}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                tracing::warn!(operation, attempts = attempt + 1, "Giving up: {err}");
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast() -> RetryConfig {
        RetryConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..RetryConfig::default()
        }
    }

    #[test]
    fn delay_doubles_and_caps() {
        let config = RetryConfig {
            jitter_factor: 0.0,
            ..RetryConfig::default()
        };
        assert_eq!(calculate_retry_delay(0, &config), Duration::from_millis(500));
        assert_eq!(calculate_retry_delay(1, &config), Duration::from_secs(1));
        assert_eq!(calculate_retry_delay(10, &config), Duration::from_secs(8));
    }

    #[test]
    fn jitter_only_shortens() {
        let config = RetryConfig::default();
        for _ in 0..50 {
            let delay = calculate_retry_delay(0, &config);
            assert!(delay <= Duration::from_millis(500));
            assert!(delay >= Duration::from_millis(374));
        }
    }

    #[tokio::test]
    async fn retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", &fast(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(SinkError::Unavailable("down".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", &fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(SinkError::Unavailable("down".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejected_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", &fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(SinkError::Rejected("bad".into())) }
        })
        .await;
        assert_eq!(result, Err(SinkError::Rejected("bad".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
