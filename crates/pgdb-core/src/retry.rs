//! Bounded retry with error classification.

use tracing::{debug, warn};

/// Why a retried operation gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// A non-retryable failure; returned as soon as it happened.
    Fatal(E),
    /// Every attempt failed with a retryable error; `last` is the final one.
    Exhausted { attempts: u32, last: E },
}

/// Run an operation up to `max_attempts` times, retrying only the errors
/// the `retryable` predicate accepts.
pub struct RetryPolicy<E> {
    max_attempts: u32,
    retryable: fn(&E) -> bool,
}

impl<E: std::fmt::Display> RetryPolicy<E> {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, retryable: fn(&E) -> bool) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retryable,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `op` receives the 1-based attempt number.
    pub fn run<T, F>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if (self.retryable)(&e) => {
                    if attempt >= self.max_attempts {
                        return Err(RetryError::Exhausted { attempts: attempt, last: e });
                    }
                    warn!(attempt, max = self.max_attempts, error = %e, "retryable failure");
                    attempt += 1;
                }
                Err(e) => return Err(RetryError::Fatal(e)),
            }
        }
    }
}
