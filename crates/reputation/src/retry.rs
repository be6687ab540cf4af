//! Bounded retry with exponential backoff for idempotent reads.

use std::{fmt::Display, future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first (default: 3).
    pub max_attempts: u32,
    /// Delay after the first failure (default: 100).
    pub initial_backoff_ms: u64,
    /// Upper bound on a single delay (default: 2000).
    pub max_backoff_ms: u64,
    /// Growth factor between delays (default: 2.0).
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before retrying after failed attempt number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay = (self.initial_backoff_ms as f64) * self.multiplier.powi(exponent);
        let delay = delay.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(delay as u64)
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
pub(crate) async fn retry<T, E, F, Fut>(
    config: &RetryConfig,
    name: &'static str,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && is_transient(&err) => {
                let delay = config.delay_for_attempt(attempt);
                debug!(op = name, attempt, ?delay, %err, "retrying after transient failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_growth_is_capped() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(10), Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_until_success() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, String> = retry(
            &RetryConfig::default(),
            "test",
            |_| true,
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("attempt {n}")) } else { Ok(n) }
            },
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), String> = retry(
            &RetryConfig::default(),
            "test",
            |_| true,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("down".to_owned())
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), String> = retry(
            &RetryConfig::default(),
            "test",
            |_| false,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("gone".to_owned())
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
