//! Retry and polling policies.
//!
//! [`RetryPolicy`] drives how the transport reacts to `429` and `5xx`
//! responses. [`JobPollPolicy`] drives how long-running jobs are polled.

use std::time::Duration;

use rand::Rng;

use crate::error::ConfigError;

/// Retry behavior for transient HTTP failures.
///
/// # Rate limiting (429)
///
/// The transport sleeps for the server's retry hint (capped at
/// `max_rate_limit_wait`) and tries again. After `max_rate_limit_retries`
/// consecutive 429 responses the request fails fatally.
///
/// # Server errors (500, 502, 503, 504)
///
/// Up to `server_error_retries` additional attempts are made, waiting
/// `backoff_base * backoff_factor^n` with `±jitter` randomization.
///
/// # Example
///
/// ```rust
/// use cms_client::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy {
///     server_error_retries: 5,
///     backoff_base: Duration::from_millis(50),
///     ..RetryPolicy::default()
/// };
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Consecutive 429 responses tolerated before failing.
    pub max_rate_limit_retries: u32,
    /// Upper bound for a single rate-limit sleep.
    pub max_rate_limit_wait: Duration,
    /// Sleep used when a 429 carries no retry hint.
    pub default_rate_limit_wait: Duration,
    /// Extra attempts after a retryable server error.
    pub server_error_retries: u32,
    /// First server-error backoff delay.
    pub backoff_base: Duration,
    /// Multiplier applied per server-error retry.
    pub backoff_factor: f64,
    /// Relative jitter applied to server-error delays, in `[0, 1)`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rate_limit_retries: 5,
            max_rate_limit_wait: Duration::from_secs(60),
            default_rate_limit_wait: Duration::from_secs(1),
            server_error_retries: 3,
            backoff_base: Duration::from_millis(200),
            backoff_factor: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Checks that the factor and jitter are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRetryPolicy`] when `backoff_factor < 1`
    /// or `jitter` lies outside `[0, 1)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.backoff_factor >= 1.0 && self.backoff_factor.is_finite()) {
            return Err(ConfigError::InvalidRetryPolicy {
                reason: format!("backoff_factor must be >= 1, got {}", self.backoff_factor),
            });
        }
        if !(0.0..1.0).contains(&self.jitter) {
            return Err(ConfigError::InvalidRetryPolicy {
                reason: format!("jitter must be in [0, 1), got {}", self.jitter),
            });
        }
        Ok(())
    }

    /// Returns the delay before server-error retry number `retry` (1-based).
    #[must_use]
    pub fn server_error_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let base = self.backoff_base.as_secs_f64() * self.backoff_factor.powi(exponent);
        let spread = if self.jitter > 0.0 {
            rand::thread_rng().gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        };
        secs_to_duration(base * (1.0 + spread))
    }

    /// Returns the sleep for a 429 given the server's hint, in seconds.
    #[must_use]
    pub fn rate_limit_delay(&self, hint_secs: Option<f64>) -> Duration {
        let wanted = hint_secs
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map_or(self.default_rate_limit_wait, secs_to_duration);
        wanted.min(self.max_rate_limit_wait)
    }
}

/// Polling schedule used while waiting for an asynchronous job.
///
/// The first poll happens immediately. Subsequent polls wait
/// `initial_interval`, growing by `factor` up to `max_interval`, until the
/// job reaches a terminal state or `timeout` elapses.
#[derive(Clone, Debug, PartialEq)]
pub struct JobPollPolicy {
    /// Delay after the first non-terminal poll.
    pub initial_interval: Duration,
    /// Growth factor between polls.
    pub factor: f64,
    /// Ceiling for the delay between polls.
    pub max_interval: Duration,
    /// Total time allowed before giving up.
    pub timeout: Duration,
}

impl Default for JobPollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            factor: 1.5,
            max_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(300),
        }
    }
}

impl JobPollPolicy {
    /// Checks that the schedule can make progress.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRetryPolicy`] for a non-finite factor or a
    /// factor below 1, a zero timeout, or an initial interval above the
    /// maximum.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.factor >= 1.0 && self.factor.is_finite()) {
            return Err(ConfigError::InvalidRetryPolicy {
                reason: format!("job poll factor must be >= 1, got {}", self.factor),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidRetryPolicy {
                reason: "job poll timeout must be positive".to_string(),
            });
        }
        if self.initial_interval > self.max_interval {
            return Err(ConfigError::InvalidRetryPolicy {
                reason: format!(
                    "initial_interval {:?} exceeds max_interval {:?}",
                    self.initial_interval, self.max_interval
                ),
            });
        }
        Ok(())
    }

    /// Returns the interval following `current`.
    #[must_use]
    pub fn next_interval(&self, current: Duration) -> Duration {
        secs_to_duration(current.as_secs_f64() * self.factor.max(1.0)).min(self.max_interval)
    }
}

/// Converts seconds to a `Duration`, saturating instead of panicking.
///
/// Negative and NaN inputs give zero; values beyond the range of `Duration`
/// give `Duration::MAX`.
pub(crate) fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_rate_limit_retries, 5);
        assert_eq!(policy.max_rate_limit_wait, Duration::from_secs(60));
        assert_eq!(policy.server_error_retries, 3);
        assert_eq!(policy.backoff_base, Duration::from_millis(200));
        assert!((policy.backoff_factor - 2.0).abs() < f64::EPSILON);
        assert!((policy.jitter - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_server_error_delay_grows_within_jitter_bounds() {
        let policy = RetryPolicy::default();
        for retry in 1..=3 {
            let expected = 0.2 * 2f64.powi(retry - 1);
            let delay = policy.server_error_delay(retry as u32).as_secs_f64();
            assert!(delay >= expected * 0.8 - 1e-9, "retry {retry}: {delay}");
            assert!(delay <= expected * 1.2 + 1e-9, "retry {retry}: {delay}");
        }
    }

    #[test]
    fn test_server_error_delay_without_jitter_is_exact() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.server_error_delay(1), Duration::from_millis(200));
        assert_eq!(policy.server_error_delay(2), Duration::from_millis(400));
        assert_eq!(policy.server_error_delay(3), Duration::from_millis(800));
    }

    #[test]
    fn test_rate_limit_delay_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.rate_limit_delay(Some(2.5)), Duration::from_millis(2500));
        assert_eq!(policy.rate_limit_delay(Some(3600.0)), Duration::from_secs(60));
        assert_eq!(policy.rate_limit_delay(None), Duration::from_secs(1));
        assert_eq!(policy.rate_limit_delay(Some(-1.0)), Duration::from_secs(1));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let policy = RetryPolicy {
            jitter: 1.5,
            ..RetryPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(ConfigError::InvalidRetryPolicy { .. })
        ));

        let policy = RetryPolicy {
            backoff_factor: 0.5,
            ..RetryPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_job_poll_validate_rejects_bad_values() {
        assert!(JobPollPolicy::default().validate().is_ok());

        for factor in [f64::INFINITY, f64::NAN, 0.5] {
            let policy = JobPollPolicy {
                factor,
                ..JobPollPolicy::default()
            };
            assert!(matches!(
                policy.validate(),
                Err(ConfigError::InvalidRetryPolicy { .. })
            ));
        }

        let policy = JobPollPolicy {
            timeout: Duration::ZERO,
            ..JobPollPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = JobPollPolicy {
            initial_interval: Duration::from_secs(10),
            max_interval: Duration::from_secs(5),
            ..JobPollPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_huge_hints_saturate_instead_of_panicking() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.rate_limit_delay(Some(1e20)), policy.max_rate_limit_wait);
        assert_eq!(policy.rate_limit_delay(Some(f64::MAX)), policy.max_rate_limit_wait);

        let steep = RetryPolicy {
            backoff_factor: 1e300,
            jitter: 0.0,
            ..RetryPolicy::default()
        };
        assert_eq!(steep.server_error_delay(5), Duration::MAX);

        let unchecked = JobPollPolicy {
            factor: f64::INFINITY,
            ..JobPollPolicy::default()
        };
        assert_eq!(
            unchecked.next_interval(Duration::from_secs(1)),
            unchecked.max_interval
        );
    }

    #[test]
    fn test_secs_to_duration_edges() {
        assert_eq!(secs_to_duration(-3.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::INFINITY), Duration::MAX);
        assert_eq!(secs_to_duration(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn test_job_poll_interval_is_bounded() {
        let policy = JobPollPolicy::default();
        let next = policy.next_interval(Duration::from_secs(1));
        assert_eq!(next, Duration::from_millis(1500));
        let capped = policy.next_interval(Duration::from_secs(4));
        assert_eq!(capped, Duration::from_secs(5));
    }
}
