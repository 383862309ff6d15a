use crate::client::StoreError;

use rand::Rng;
use serde::Deserialize;
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::warn;

/// Exponential backoff with full jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Backoff {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_retries: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay_ms: 50,
            max_delay_ms: 5_000,
            max_retries: 8,
        }
    }
}

impl Backoff {
    /// Upper bound of the delay before retry number `attempt` (0-based).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt).as_millis() as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=ceiling))
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent.
    pub async fn retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay(attempt);
                    warn!("{what} failed ({err}), retrying in {delay:?}");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn backoff(max_retries: u32) -> Backoff {
        Backoff {
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            max_retries,
        }
    }

    #[test]
    fn it_doubles_the_ceiling_up_to_the_cap() {
        let b = backoff(3);
        assert_eq!(b.ceiling(0), Duration::from_millis(100));
        assert_eq!(b.ceiling(1), Duration::from_millis(200));
        assert_eq!(b.ceiling(3), Duration::from_millis(800));
        assert_eq!(b.ceiling(4), Duration::from_millis(1_000));
        assert_eq!(b.ceiling(80), Duration::from_millis(1_000));
    }

    #[test]
    fn it_keeps_jitter_below_the_ceiling() {
        let b = backoff(3);
        for attempt in 0..10 {
            assert!(b.delay(attempt) <= b.ceiling(attempt));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn it_retries_transient_errors() {
        let calls = AtomicU32::new(0);

        let result = backoff(3)
            .retry("op", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StoreError::Throttled("busy".into()))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn it_gives_up_after_the_budget() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = backoff(2)
            .retry("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::ResourceInUse("table".into()))
            })
            .await;

        assert!(matches!(result, Err(StoreError::ResourceInUse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn it_does_not_retry_rejections() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = backoff(5)
            .retry("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Rejected("bad request".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
