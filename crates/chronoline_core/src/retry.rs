//! Bounded exponential-backoff retry for collaborator calls.
//!
//! # Responsibility
//! - Re-run fallible network-style operations a bounded number of times.
//! - Keep sleeping behind a seam so callers and tests control time.
//!
//! # Invariants
//! - An operation is attempted at most `max_attempts` times.
//! - Delay before attempt `k + 1` is `initial_delay * multiplier^(k - 1)`.
//! - Exhaustion surfaces the last error; it is never swallowed.

use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MULTIPLIER: u32 = 2;

/// Retry schedule configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Policy that tries once and never sleeps.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed 1-based attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.initial_delay.saturating_mul(factor)
    }
}

/// Sleep seam for retry loops.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Terminal retry failure.
#[derive(Debug)]
pub enum RetryError<E> {
    Exhausted { attempts: u32, last_error: E },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn into_last_error(self) -> E {
        match self {
            Self::Exhausted { last_error, .. } => last_error,
        }
    }
}

impl<E: Display> Display for RetryError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {attempts} attempts: {last_error}"),
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Exhausted { last_error, .. } => Some(last_error),
        }
    }
}

/// Runs `operation` until it succeeds or the policy is exhausted.
///
/// `operation` receives the 1-based attempt number.
pub fn retry_with_backoff<T, E, F>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => {
                error!(
                    "event=retry_exhausted module=retry status=error attempts={} error={}",
                    attempt, err
                );
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last_error: err,
                });
            }
            Err(err) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "event=retry_scheduled module=retry status=retry attempt={} delay_ms={} error={}",
                    attempt,
                    delay.as_millis(),
                    err
                );
                sleeper.sleep(delay);
                attempt += 1;
            }
        }
    }
}
