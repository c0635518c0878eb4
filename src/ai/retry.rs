//! Bounded exponential backoff around a fallible async operation.

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: usize,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delays slept between attempts: `initial * 2^i`, one fewer than `max_attempts`.
    pub fn backoff(&self) -> impl Iterator<Item = Duration> {
        let initial = self.initial_backoff;
        let retries = u32::try_from(self.max_attempts.saturating_sub(1)).unwrap_or(u32::MAX);
        (0..retries).map(move |i| initial.saturating_mul(1u32.checked_shl(i).unwrap_or(u32::MAX)))
    }
}

/// Runs `operation` until it succeeds, fails with a non-transient error, or the
/// policy runs out of attempts. The closure receives the 1-based attempt number.
///
/// Each failed transient attempt is logged at warn; non-transient errors are
/// returned unlogged for the caller to report.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts;
    let mut attempt = 0;

    RetryIf::spawn(
        policy.backoff(),
        || {
            attempt += 1;
            let current = attempt;
            let fut = operation(current);
            async move {
                let result = fut.await;
                match &result {
                    Err(e) if e.is_transient() => tracing::warn!(
                        attempt = current,
                        max_attempts,
                        "Gemini call failed on attempt {}: {}",
                        current,
                        e
                    ),
                    _ => {}
                }
                result
            }
        },
        |e: &Error| e.is_transient(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// In-memory sink for formatted log output.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn install(&self) -> tracing::subscriber::DefaultGuard {
            let writer = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::WARN)
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        fn attempt_lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .filter(|line| line.contains("Gemini call failed on attempt"))
                .map(str::to_string)
                .collect()
        }
    }

    fn transient() -> Error {
        Error::AiStatus {
            status: 503,
            body: "unavailable".to_string(),
        }
    }

    #[test]
    fn test_default_backoff_doubles_from_one_second() {
        let delays: Vec<u64> = RetryPolicy::default()
            .backoff()
            .map(|d| d.as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8]);
    }

    #[test]
    fn test_single_attempt_policy_never_sleeps() {
        let policy = RetryPolicy {
            max_attempts: 1,
            initial_backoff: Duration::from_secs(1),
        };
        assert_eq!(policy.backoff().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_fifth_attempt_after_doubling_sleeps() {
        let started = Instant::now();
        let mut attempt_times = Vec::new();

        let result = with_backoff(&RetryPolicy::default(), |attempt| {
            attempt_times.push(started.elapsed());
            async move {
                if attempt < 5 {
                    Err(transient())
                } else {
                    Ok("answer")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "answer");
        let gaps: Vec<u64> = attempt_times
            .windows(2)
            .map(|w| (w[1] - w[0]).as_secs())
            .collect();
        assert_eq!(gaps, vec![1, 2, 4, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let started = Instant::now();
        let mut attempts = 0;

        let result: Result<()> = with_backoff(&RetryPolicy::default(), |_| {
            attempts += 1;
            async { Err(transient()) }
        })
        .await;

        assert!(matches!(result, Err(Error::AiStatus { status: 503, .. })));
        assert_eq!(attempts, 5);
        // 1 + 2 + 4 + 8; nothing is slept after the last attempt.
        assert_eq!(started.elapsed().as_secs(), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logs_each_failed_attempt_before_success() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let result = with_backoff(&RetryPolicy::default(), |attempt| async move {
            if attempt < 5 {
                Err(transient())
            } else {
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
        let lines = logs.attempt_lines();
        assert_eq!(lines.len(), 4);
        for (i, line) in lines.iter().enumerate() {
            let attempt = i + 1;
            assert!(line.contains("WARN"), "{}", line);
            assert!(line.contains(&format!("attempt={}", attempt)), "{}", line);
            assert!(line.contains("status 503"), "{}", line);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_logs_every_attempt_when_all_fail() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let result: Result<()> =
            with_backoff(&RetryPolicy::default(), |_| async { Err(transient()) }).await;

        assert!(result.is_err());
        let lines = logs.attempt_lines();
        assert_eq!(lines.len(), 5);
        assert!(lines[4].contains("attempt=5"), "{}", lines[4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_is_left_to_caller_to_log() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let result: Result<()> =
            with_backoff(&RetryPolicy::default(), |_| async { Err(Error::NoCandidates) }).await;

        assert!(matches!(result, Err(Error::NoCandidates)));
        assert!(logs.attempt_lines().is_empty());
    }

    #[test]
    fn test_huge_attempt_count_saturates_retry_count() {
        let policy = RetryPolicy {
            max_attempts: usize::MAX,
            initial_backoff: Duration::from_millis(1),
        };
        let mut delays = policy.backoff();
        assert_eq!(delays.next(), Some(Duration::from_millis(1)));
        assert_eq!(delays.nth(40), Some(Duration::from_millis(1).saturating_mul(u32::MAX)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_is_not_retried() {
        let mut attempts = 0;

        let result: Result<()> = with_backoff(&RetryPolicy::default(), |_| {
            attempts += 1;
            async { Err(Error::NoCandidates) }
        })
        .await;

        assert!(matches!(result, Err(Error::NoCandidates)));
        assert_eq!(attempts, 1);
    }
}
