//! Bounded polling for objects that appear eventually.
//!
//! A check is run immediately and then once per interval until it yields a
//! value or the policy's timeout elapses. The check decides which failures are
//! retryable: `Ok(None)` means "not there yet, keep waiting" and `Err` aborts
//! the wait at once.
//!
//! Time comes from `tokio::time`, so tests drive the loop with a paused clock.
//!
//! # Example
//!
//! ```ignore
//! use registry_storage::poll::{poll_until_ready, PollPolicy};
//!
//! let secret = poll_until_ready(
//!     &PollPolicy::default(),
//!     "secret openshift-image-registry/installer-cloud-credentials",
//!     || async { client.get_secret(namespace, name).await },
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::Error;

/// Default spacing between poll attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default ceiling for a poll
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Spacing and ceiling for a bounded poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between consecutive attempts
    pub interval: Duration,
    /// Total time after which the poll gives up
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PollPolicy {
    /// Create a policy with the given interval and timeout
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Run `check` until it produces a value or `policy.timeout` elapses.
///
/// The first attempt happens immediately. An attempt is never started once
/// the next one would begin past the deadline, so a poll that never succeeds
/// returns [`Error::Timeout`] after roughly `policy.timeout`. A timeout too
/// large to represent as an instant means the poll has no deadline.
///
/// # Arguments
/// * `policy` - Interval and timeout
/// * `operation` - What is being waited for, used in logs and the timeout error
/// * `check` - Returns `Ok(Some(v))` when ready, `Ok(None)` to keep waiting,
///   or `Err` to abort the poll immediately
pub async fn poll_until_ready<T, F, Fut>(
    policy: &PollPolicy,
    operation: &str,
    mut check: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, Error>>,
{
    let start = Instant::now();
    let deadline = start.checked_add(policy.timeout);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match check().await {
            Ok(Some(value)) => {
                debug!(
                    operation = %operation,
                    attempt = attempt,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Poll condition met"
                );
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    operation = %operation,
                    attempt = attempt,
                    error = %e,
                    "Poll aborted on non-retryable error"
                );
                return Err(e);
            }
        }

        if past_deadline(deadline, policy.interval) {
            warn!(
                operation = %operation,
                attempt = attempt,
                timeout_secs = policy.timeout.as_secs(),
                "Poll timed out"
            );
            return Err(Error::timeout(operation, start.elapsed()));
        }

        // Log the first miss and then once a minute at the default interval
        if attempt == 1 || attempt % 60 == 0 {
            debug!(operation = %operation, attempt = attempt, "Still waiting");
        }

        tokio::time::sleep(policy.interval).await;
    }
}

/// Whether the next attempt, one `interval` from now, would start past `deadline`
fn past_deadline(deadline: Option<Instant>, interval: Duration) -> bool {
    match deadline {
        Some(deadline) => Instant::now()
            .checked_add(interval)
            .map_or(true, |next| next > deadline),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_attempt_does_not_sleep() {
        let start = Instant::now();
        let result = poll_until_ready(&PollPolicy::default(), "op", || async {
            Ok::<_, Error>(Some(42))
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_several_misses() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let start = Instant::now();

        let result = poll_until_ready(&PollPolicy::default(), "op", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 3 {
                    Ok(None)
                } else {
                    Ok(Some("ready"))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ready");
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_full_ceiling() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let start = Instant::now();

        let result: Result<(), Error> =
            poll_until_ready(&PollPolicy::default(), "secret ns/name", || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("secret ns/name"));
        assert_eq!(start.elapsed(), DEFAULT_POLL_TIMEOUT);
        // Immediate attempt plus one per second of the five minute ceiling
        assert_eq!(count.load(Ordering::SeqCst), 301);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_aborts_without_waiting() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let start = Instant::now();

        let result: Result<(), Error> = poll_until_ready(&PollPolicy::default(), "op", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(None)
                } else {
                    Err(Error::client_config("forbidden"))
                }
            }
        })
        .await;

        assert!(matches!(result, Err(Error::ClientConfig { .. })));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_policy_respected() {
        let policy = PollPolicy::new(Duration::from_millis(250), Duration::from_secs(1));
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result: Result<(), Error> = poll_until_ready(&policy, "op", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        })
        .await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_timeout_means_no_deadline() {
        let policy = PollPolicy::new(Duration::from_secs(1), Duration::from_secs(u64::MAX));

        let result = poll_until_ready(&policy, "op", || async { Ok::<_, Error>(Some(7)) }).await;
        assert_eq!(result.unwrap(), 7);

        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let start = Instant::now();
        let result = poll_until_ready(&policy, "op", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Ok(None)
                } else {
                    Ok(Some("ready"))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ready");
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_interval_times_out_after_first_miss() {
        let policy = PollPolicy::new(Duration::from_secs(u64::MAX), Duration::from_secs(300));
        let start = Instant::now();

        let result: Result<(), Error> =
            poll_until_ready(&policy, "op", || async { Ok(None) }).await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
