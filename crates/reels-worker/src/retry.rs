//! Bounded exponential-backoff retry.
//!
//! Attempt `i` (0-based) that fails waits `base_delay * 2^i` before attempt
//! `i + 1`. There is no jitter and no cap; callers bound latency through
//! `max_attempts`. The last error is returned unchanged.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::metrics;

/// One scheduled retry, reported to observers before the wait.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryEvent {
    pub operation: String,
    /// 1-based number of the attempt that just failed
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub error: String,
}

impl fmt::Display for RetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Retry {}/{} for {} after {:.1}s: {}",
            self.attempt,
            self.max_attempts,
            self.operation,
            self.delay.as_secs_f64(),
            self.error
        )
    }
}

type RetryObserver = Arc<dyn Fn(&RetryEvent) + Send + Sync>;

/// Runs fallible async work with exponential backoff.
#[derive(Clone)]
pub struct RetryExecutor {
    max_attempts: u32,
    base_delay: Duration,
    operation_name: String,
    observer: Option<RetryObserver>,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("operation_name", &self.operation_name)
            .finish()
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            operation_name: "operation".to_string(),
            observer: None,
        }
    }
}

impl RetryExecutor {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    /// Set the total number of attempts (at least 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Notify `observer` of every scheduled retry.
    pub fn with_observer(mut self, observer: impl Fn(&RetryEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Same settings and observer under another operation name.
    pub fn named(&self, operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..self.clone()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the failed attempt `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Retry every error until attempts run out.
    pub async fn run<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run_if(operation, |_| true).await
    }

    /// Retry only errors accepted by `should_retry`; others return immediately.
    pub async fn run_if<F, Fut, T, E, P>(&self, mut operation: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 < self.max_attempts && should_retry(&e) => {
                    let delay = self.delay_for_attempt(attempt);
                    attempt += 1;

                    let event = RetryEvent {
                        operation: self.operation_name.clone(),
                        attempt,
                        max_attempts: self.max_attempts,
                        delay,
                        error: e.to_string(),
                    };
                    warn!(
                        operation = %event.operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %event.error,
                        "Retrying after failure"
                    );
                    metrics::record_retry(&self.operation_name);
                    if let Some(observer) = &self.observer {
                        observer(&event);
                    }

                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[test]
    fn test_delay_doubles_without_cap() {
        let retry = RetryExecutor::new("test").with_base_delay(Duration::from_secs(1));

        assert_eq!(retry.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(retry.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(retry.delay_for_attempt(6), Duration::from_secs(64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success() {
        let retry = RetryExecutor::new("test");
        let call_count = AtomicU32::new(0);

        let result = retry
            .run(|| {
                call_count.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, String>(42) }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_k_failures() {
        let retry = RetryExecutor::new("test").with_max_attempts(3);
        let call_count = AtomicU32::new(0);

        let result = retry
            .run(|| {
                let count = call_count.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count < 2 {
                        Err(format!("transient {}", count))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let retry = RetryExecutor::new("test").with_max_attempts(3);
        let call_count = AtomicU32::new(0);

        let result: Result<(), String> = retry
            .run(|| {
                let count = call_count.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("failure {}", count)) }
            })
            .await;

        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let retry = RetryExecutor::new("test")
            .with_max_attempts(4)
            .with_base_delay(Duration::from_secs(1));
        let calls = Mutex::new(Vec::new());

        let _: Result<(), &str> = retry
            .run(|| {
                calls.lock().unwrap().push(Instant::now());
                async { Err("nope") }
            })
            .await;

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.len(), 4);
        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        for (i, gap) in gaps.iter().enumerate() {
            let expected = Duration::from_secs(1 << i);
            assert!(
                *gap >= expected && *gap < expected + Duration::from_millis(50),
                "gap {} was {:?}",
                i,
                gap
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_stops() {
        let retry = RetryExecutor::new("test").with_max_attempts(3);
        let call_count = AtomicU32::new(0);

        let result: Result<(), &str> = retry
            .run_if(
                || {
                    call_count.fetch_add(1, Ordering::SeqCst);
                    async { Err("fatal") }
                },
                |e| *e != "fatal",
            )
            .await;

        assert_eq!(result, Err("fatal"));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_each_retry() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let retry = RetryExecutor::new("audio 1:1")
            .with_max_attempts(3)
            .with_observer(move |e| sink.lock().unwrap().push(e.clone()));

        let _: Result<(), &str> = retry.run(|| async { Err("timeout") }).await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].attempt, 1);
        assert_eq!(events[1].delay, Duration::from_secs(2));
        assert_eq!(
            events[0].to_string(),
            "Retry 1/3 for audio 1:1 after 1.0s: timeout"
        );
    }
}
