//! Tracker call pacing and retry.
//!
//! Every tracker call goes through [`RateLimiter::call`]: a minimum
//! inter-call delay keeps us under the tracker's secondary rate limits,
//! and transient failures retry with exponential backoff. When the server
//! names a wait (`Retry-After`), that wins over the computed backoff.

use super::TrackerError;
use std::cell::Cell;
use std::time::{Duration, Instant};
use tracing::warn;

pub struct RateLimiter {
    min_interval: Duration,
    base_delay: Duration,
    max_attempts: u32,
    last_call: Cell<Option<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_secs(2), 4)
    }
}

impl RateLimiter {
    pub fn new(min_interval: Duration, base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            min_interval,
            base_delay,
            max_attempts,
            last_call: Cell::new(None),
        }
    }

    /// Run one tracker call under pacing and retry discipline.
    ///
    /// # Errors
    ///
    /// Non-retryable errors pass through unchanged; retryable errors that
    /// survive every attempt surface as [`TrackerError::RetriesExhausted`].
    pub fn call<T>(
        &self,
        mut op: impl FnMut() -> Result<T, TrackerError>,
    ) -> Result<T, TrackerError> {
        self.pace();
        let mut attempt = 0u32;
        loop {
            match op() {
                Ok(value) => {
                    self.last_call.set(Some(Instant::now()));
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = self.retry_delay(&err, attempt);
                    warn!(
                        "Tracker call failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.max_attempts,
                        delay,
                        err
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    self.last_call.set(Some(Instant::now()));
                    return Err(TrackerError::RetriesExhausted {
                        attempts: attempt + 1,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    self.last_call.set(Some(Instant::now()));
                    return Err(err);
                }
            }
        }
    }

    /// Sleep off whatever remains of the minimum inter-call interval.
    fn pace(&self) {
        if let Some(last) = self.last_call.get() {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
    }

    fn retry_delay(&self, err: &TrackerError, attempt: u32) -> Duration {
        if let TrackerError::RateLimited {
            retry_after: Some(seconds),
            ..
        } = err
        {
            return Duration::from_secs(*seconds);
        }
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_limiter() -> RateLimiter {
        RateLimiter::new(Duration::ZERO, Duration::from_millis(1), 3)
    }

    #[test]
    fn test_success_passes_through() {
        let limiter = fast_limiter();
        let result: Result<u32, TrackerError> = limiter.call(|| Ok(7));
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_transient_retries_until_success() {
        let limiter = fast_limiter();
        let mut calls = 0;
        let result = limiter.call(|| {
            calls += 1;
            if calls < 3 {
                Err(TrackerError::Transient {
                    status: 502,
                    message: "bad gateway".to_string(),
                })
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_exhaustion_surfaces_retries_exhausted() {
        let limiter = fast_limiter();
        let mut calls = 0;
        let result: Result<(), TrackerError> = limiter.call(|| {
            calls += 1;
            Err(TrackerError::RateLimited {
                status: 429,
                retry_after: None,
            })
        });
        assert_eq!(calls, 3);
        match result {
            Err(TrackerError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, TrackerError::RateLimited { .. }));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_permanent_error_not_retried() {
        let limiter = fast_limiter();
        let mut calls = 0;
        let result: Result<(), TrackerError> = limiter.call(|| {
            calls += 1;
            Err(TrackerError::Permanent {
                status: 401,
                message: "bad credentials".to_string(),
            })
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(TrackerError::Permanent { .. })));
    }

    #[test]
    fn test_pacing_enforces_min_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(30), Duration::ZERO, 1);
        let start = Instant::now();
        let _: Result<(), TrackerError> = limiter.call(|| Ok(()));
        let _: Result<(), TrackerError> = limiter.call(|| Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
