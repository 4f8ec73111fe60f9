//! Tunables for reconfiguration batches.

use super::SettingsError;
use crate::task::domain::ActorId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff policy for lock conflicts while marking tasks.
///
/// Delays grow exponentially from `base_delay_ms`, are capped at
/// `max_delay_ms` and, with `jitter`, are drawn uniformly from zero up to
/// that cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockRetryPolicy {
    /// Lock attempts per task, including the first.
    pub max_attempts: u32,
    /// Delay cap before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Whether delays are randomised below their cap.
    pub jitter: bool,
}

impl Default for LockRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 50,
            max_delay_ms: 2_000,
            jitter: true,
        }
    }
}

impl LockRetryPolicy {
    /// Returns the delay cap for the retry with zero-based index
    /// `retry_index`, in milliseconds.
    #[must_use]
    pub fn delay_cap_ms(&self, retry_index: u32) -> u64 {
        let factor = 1_u64.checked_shl(retry_index).unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    /// Returns the delay before the retry with zero-based index
    /// `retry_index`.
    pub fn delay(&self, retry_index: u32, rng: &mut impl Rng) -> Duration {
        let cap = self.delay_cap_ms(retry_index);
        let millis = if self.jitter && cap > 0 {
            rng.gen_range(0..=cap)
        } else {
            cap
        };
        Duration::from_millis(millis)
    }
}

/// Defaults and limits applied to every reconfiguration batch.
///
/// # Examples
///
/// ```
/// use caseflow::reconfiguration::domain::ReconfigurationSettings;
///
/// let settings = ReconfigurationSettings::from_json(r#"{"retry_window_hours": 6}"#)
///     .expect("valid settings");
/// assert_eq!(settings.retry_window_hours, 6);
/// assert_eq!(settings.lock_retry.max_attempts, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconfigurationSettings {
    /// Actor recorded on every mutation a batch performs.
    pub system_actor: ActorId,
    /// Default time budget of a batch, in seconds.
    pub max_time_limit_seconds: u64,
    /// Default window, in hours, within which dirty tasks are executed.
    pub retry_window_hours: u32,
    /// Age, in seconds, a pending request must reach before it is reported
    /// as failing.
    pub failure_report_delay_seconds: u64,
    /// Lock conflict backoff while marking.
    pub lock_retry: LockRetryPolicy,
}

impl Default for ReconfigurationSettings {
    fn default() -> Self {
        Self {
            system_actor: ActorId::system(),
            max_time_limit_seconds: 60,
            retry_window_hours: 2,
            failure_report_delay_seconds: 30 * 60,
            lock_retry: LockRetryPolicy::default(),
        }
    }
}

impl ReconfigurationSettings {
    /// Creates settings for short scheduled runs that give up quickly.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_time_limit_seconds: 30,
            retry_window_hours: 1,
            failure_report_delay_seconds: 15 * 60,
            lock_retry: LockRetryPolicy {
                max_attempts: 3,
                base_delay_ms: 25,
                max_delay_ms: 500,
                jitter: true,
            },
            ..Self::default()
        }
    }

    /// Creates settings for long manual runs that tolerate contention.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            max_time_limit_seconds: 300,
            retry_window_hours: 24,
            failure_report_delay_seconds: 60 * 60,
            lock_retry: LockRetryPolicy {
                max_attempts: 10,
                base_delay_ms: 100,
                max_delay_ms: 5_000,
                jitter: true,
            },
            ..Self::default()
        }
    }

    /// Parses and validates settings from JSON; missing keys keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Format`] for malformed JSON and
    /// [`SettingsError::Invalid`] for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] naming the first offending
    /// setting.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.system_actor.as_str().trim().is_empty() {
            return Err(SettingsError::Invalid("system_actor must not be blank"));
        }
        if self.max_time_limit_seconds == 0 {
            return Err(SettingsError::Invalid("max_time_limit_seconds must be positive"));
        }
        if self.retry_window_hours == 0 {
            return Err(SettingsError::Invalid("retry_window_hours must be positive"));
        }
        if self.failure_report_delay_seconds >= u64::from(self.retry_window_hours) * 3_600 {
            return Err(SettingsError::Invalid(
                "failure_report_delay_seconds must be shorter than the retry window",
            ));
        }
        if self.lock_retry.max_attempts == 0 {
            return Err(SettingsError::Invalid("lock_retry.max_attempts must be positive"));
        }
        if self.lock_retry.base_delay_ms > self.lock_retry.max_delay_ms {
            return Err(SettingsError::Invalid(
                "lock_retry.base_delay_ms must not exceed max_delay_ms",
            ));
        }
        Ok(())
    }

    /// Sets the system actor.
    #[must_use]
    pub fn with_system_actor(mut self, actor: ActorId) -> Self {
        self.system_actor = actor;
        self
    }

    /// Sets the default batch time budget.
    #[must_use]
    pub const fn with_max_time_limit_seconds(mut self, seconds: u64) -> Self {
        self.max_time_limit_seconds = seconds;
        self
    }

    /// Sets the default retry window.
    #[must_use]
    pub const fn with_retry_window_hours(mut self, hours: u32) -> Self {
        self.retry_window_hours = hours;
        self
    }

    /// Sets the failure report delay.
    #[must_use]
    pub const fn with_failure_report_delay_seconds(mut self, seconds: u64) -> Self {
        self.failure_report_delay_seconds = seconds;
        self
    }

    /// Sets the lock retry policy.
    #[must_use]
    pub fn with_lock_retry(mut self, policy: LockRetryPolicy) -> Self {
        self.lock_retry = policy;
        self
    }
}
