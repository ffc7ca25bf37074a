//! Bounded backend calls

use crate::config::{ConfigError, DEFAULT_BACKEND_TIMEOUT};
use crate::GatewayError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    duration: Duration,
}

impl TimeoutPolicy {
    /// Create a timeout policy. Rejects zero and `Duration::MAX`.
    pub fn new(duration: Duration) -> Result<Self, ConfigError> {
        if duration.is_zero() || duration == Duration::MAX {
            return Err(ConfigError::InvalidTimeout(duration));
        }
        Ok(Self { duration })
    }

    /// Inspect the configured timeout duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Run `operation`, failing with `BackendUnavailable` once the deadline passes.
    ///
    /// The operation's own errors pass through unchanged.
    pub async fn execute<T, Fut>(&self, operation: Fut) -> Result<T, GatewayError>
    where
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let start = Instant::now();

        match tokio::time::timeout(self.duration, operation).await {
            Ok(result) => result,
            Err(_) => {
                let elapsed = start.elapsed();
                Err(GatewayError::timed_out(elapsed, self.duration))
            }
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self { duration: DEFAULT_BACKEND_TIMEOUT }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn rejects_degenerate_durations() {
        assert_eq!(
            TimeoutPolicy::new(Duration::ZERO),
            Err(ConfigError::InvalidTimeout(Duration::ZERO))
        );
        assert!(TimeoutPolicy::new(Duration::MAX).is_err());
        assert_eq!(TimeoutPolicy::default().duration(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn completes_before_timeout() {
        let timeout = TimeoutPolicy::new(Duration::from_millis(100)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = timeout
            .execute(async move {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(42)
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_surfaces_as_unavailable() {
        let timeout = TimeoutPolicy::new(Duration::from_millis(50)).unwrap();

        let result = timeout
            .execute(async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, GatewayError>(())
            })
            .await;

        match result.unwrap_err() {
            GatewayError::BackendUnavailable { reason } => {
                assert!(reason.contains("timed out"), "{}", reason);
            }
            e => panic!("expected BackendUnavailable, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn propagates_backend_errors() {
        let timeout = TimeoutPolicy::new(Duration::from_secs(1)).unwrap();

        let result = timeout
            .execute(async { Err::<(), _>(GatewayError::backend(Some(400), "bad yql")) })
            .await;

        match result.unwrap_err() {
            GatewayError::Backend { status, message, .. } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "bad yql");
            }
            e => panic!("expected Backend error, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn instant_operation() {
        let timeout = TimeoutPolicy::new(Duration::from_millis(100)).unwrap();
        let result = timeout.execute(async { Ok::<_, GatewayError>(99) }).await;
        assert_eq!(result.unwrap(), 99);
    }
}
