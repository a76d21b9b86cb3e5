//! Engagement scheduler, daily digest and admin alert configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Follow-up nudges and the daily digest
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementConfig {
    /// Seconds between inactivity polls per tenant
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Inactivity before the fast nudge, in minutes
    #[serde(default = "default_fast_after")]
    pub fast_after_minutes: i64,

    /// Inactivity before the value nudge, in minutes
    #[serde(default = "default_value_after")]
    pub value_after_minutes: i64,

    /// UTC hour at which the daily digest goes out
    #[serde(default = "default_digest_hour")]
    pub digest_hour_utc: u32,

    #[serde(default = "default_backoff_initial")]
    pub backoff_initial_secs: u64,

    #[serde(default = "default_backoff_max")]
    pub backoff_max_secs: u64,

    /// Delay before a crashed tenant loop is restarted
    #[serde(default = "default_restart_delay")]
    pub restart_delay_secs: u64,

    /// Start schedulers for all active tenants on boot
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

impl EngagementConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fast_after(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.fast_after_minutes)
    }

    pub fn value_after(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.value_after_minutes)
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_secs(self.backoff_initial_secs)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_secs == 0 {
            return Err(ValidationError::InvalidDuration("ENGAGEMENT__POLL_INTERVAL_SECS"));
        }
        if self.fast_after_minutes <= 0 {
            return Err(ValidationError::InvalidDuration("ENGAGEMENT__FAST_AFTER_MINUTES"));
        }
        if self.fast_after_minutes >= self.value_after_minutes {
            return Err(ValidationError::NudgeThresholdOrder);
        }
        if self.digest_hour_utc > 23 {
            return Err(ValidationError::InvalidDigestHour);
        }
        if self.backoff_initial_secs == 0 || self.backoff_initial_secs > self.backoff_max_secs {
            return Err(ValidationError::InvalidBackoff);
        }
        Ok(())
    }
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            fast_after_minutes: default_fast_after(),
            value_after_minutes: default_value_after(),
            digest_hour_utc: default_digest_hour(),
            backoff_initial_secs: default_backoff_initial(),
            backoff_max_secs: default_backoff_max(),
            restart_delay_secs: default_restart_delay(),
            autostart: default_autostart(),
        }
    }
}

/// Hot-lead alert delivery
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    /// Delay before the single retry of a transient failure, in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl AlertsConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.retry_delay_ms > 60_000 {
            return Err(ValidationError::InvalidDuration("ALERTS__RETRY_DELAY_MS"));
        }
        Ok(())
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay(),
        }
    }
}

fn default_poll_interval() -> u64 {
    30 * 60
}

fn default_fast_after() -> i64 {
    15
}

fn default_value_after() -> i64 {
    120
}

fn default_digest_hour() -> u32 {
    9
}

fn default_backoff_initial() -> u64 {
    5
}

fn default_backoff_max() -> u64 {
    300
}

fn default_restart_delay() -> u64 {
    5
}

fn default_autostart() -> bool {
    true
}

fn default_retry_delay() -> u64 {
    2_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_defaults() {
        let config = EngagementConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(1800));
        assert_eq!(config.fast_after(), chrono::Duration::minutes(15));
        assert_eq!(config.value_after(), chrono::Duration::hours(2));
        assert_eq!(config.digest_hour_utc, 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_thresholds_must_be_ordered() {
        let config = EngagementConfig {
            fast_after_minutes: 180,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::NudgeThresholdOrder));
    }

    #[test]
    fn test_digest_hour_bounds() {
        let config = EngagementConfig {
            digest_hour_utc: 24,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidDigestHour));
    }

    #[test]
    fn test_backoff_bounds() {
        let config = EngagementConfig {
            backoff_initial_secs: 600,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidBackoff));
    }

    #[test]
    fn test_alert_retry_delay() {
        assert_eq!(AlertsConfig::default().retry_delay(), Duration::from_secs(2));
        assert!(AlertsConfig { retry_delay_ms: 120_000 }.validate().is_err());
    }
}
