// ============================================================================
// clipmine-core/src/retry.rs
// ============================================================================
//
// RETRY: Uniform Retry Policy for Transient External Failures
//
// Every call to the hosted analysis API goes through `retry`. The caller
// supplies the operation and a classifier that maps each error onto a
// `Disposition`; the policy supplies the attempt limit and the delay schedule.
//
// DELAY SCHEDULE (attempt is 1-based):
// - RateLimited: base_delay * attempt
// - ServerError: base_delay * 2
// - Transient:   base_delay
//
// AI-ASSISTANT-INFO: Retry policy, error classification and the retry loop

// ---- Standard library imports ----
use std::fmt::Display;
use std::thread;
use std::time::Duration;

/// Why a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// The service asked us to slow down (HTTP 429)
    RateLimited,
    /// The service failed internally (HTTP 5xx)
    ServerError,
    /// Network or other short-lived failure
    Transient,
}

/// Classification of an error by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Retry(RetryReason),
    Fatal,
}

/// Attempt limit and base delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

/// Default number of attempts for API calls.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay between attempts.
pub const DEFAULT_BASE_DELAY_SECS: u64 = 30;

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(DEFAULT_BASE_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before the attempt following failed attempt number `attempt`.
    pub fn delay_for(&self, reason: RetryReason, attempt: u32) -> Duration {
        match reason {
            RetryReason::RateLimited => self.base_delay * attempt.max(1),
            RetryReason::ServerError => self.base_delay * 2,
            RetryReason::Transient => self.base_delay,
        }
    }
}

/// Runs `op` until it succeeds, fails fatally, or the attempts run out.
///
/// # Arguments
///
/// * `policy` - Attempt limit and delay schedule
/// * `label` - Operation name used in log messages
/// * `classify` - Maps an error onto retry or fatal
/// * `op` - The operation; receives the 1-based attempt number
///
/// # Returns
///
/// The first success, the first fatal error, or the last error once
/// `policy.max_attempts` attempts have failed.
pub fn retry<T, E, C, F>(policy: &RetryPolicy, label: &str, classify: C, op: F) -> Result<T, E>
where
    E: Display,
    C: Fn(&E) -> Disposition,
    F: FnMut(u32) -> Result<T, E>,
{
    retry_with_sleep(policy, label, classify, op, thread::sleep)
}

/// Same as [`retry`] with an injectable sleep.
pub fn retry_with_sleep<T, E, C, F, S>(
    policy: &RetryPolicy,
    label: &str,
    classify: C,
    mut op: F,
    mut sleep: S,
) -> Result<T, E>
where
    E: Display,
    C: Fn(&E) -> Disposition,
    F: FnMut(u32) -> Result<T, E>,
    S: FnMut(Duration),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let reason = match classify(&err) {
            Disposition::Fatal => {
                log::error!("{} failed: {}", label, err);
                return Err(err);
            }
            Disposition::Retry(reason) => reason,
        };

        if attempt >= max_attempts {
            log::error!("{} failed after {} attempts: {}", label, attempt, err);
            return Err(err);
        }

        let delay = policy.delay_for(reason, attempt);
        log::warn!(
            "{} attempt {}/{} failed ({:?}): {}. Retrying in {}s",
            label,
            attempt,
            max_attempts,
            reason,
            err,
            delay.as_secs_f64()
        );
        sleep(delay);
        attempt += 1;
    }
}
