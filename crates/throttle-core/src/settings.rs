//! Throttle settings and validation.
//!
//! Hosts frequently carry the interval around as a plain signed number of
//! milliseconds (config files, environment variables, CLI flags). These types
//! validate that representation once and hand the gate a typed `Duration`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default interval used when no value is configured.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Throttle settings structure.
///
/// All fields are optional to support partial configuration and graceful
/// defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ThrottleSettings {
    /// Minimum spacing between executions, in milliseconds.
    pub interval_ms: Option<i64>,
}

impl ThrottleSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            interval_ms: Some(DEFAULT_INTERVAL_MS as i64),
        }
    }

    /// Create settings for an explicit interval.
    #[must_use]
    pub const fn with_interval_ms(interval_ms: i64) -> Self {
        Self {
            interval_ms: Some(interval_ms),
        }
    }

    /// Validate and convert into the effective interval.
    ///
    /// Negative values are rejected rather than clamped.
    pub fn interval(&self) -> Result<Duration, SettingsError> {
        validate_settings(self)?;
        let millis = self
            .interval_ms
            .map_or(DEFAULT_INTERVAL_MS, i64::unsigned_abs);
        Ok(Duration::from_millis(millis))
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Interval must be a non-negative number of milliseconds, got {0}")]
    NegativeInterval(i64),
}

/// Validate settings values.
pub const fn validate_settings(settings: &ThrottleSettings) -> Result<(), SettingsError> {
    if let Some(ms) = settings.interval_ms {
        if ms < 0 {
            return Err(SettingsError::NegativeInterval(ms));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_settings() {
        let settings = ThrottleSettings::with_defaults();
        assert_eq!(settings.interval_ms, Some(1000));
        assert_eq!(settings.interval(), Ok(Duration::from_secs(1)));
    }

    #[test]
    fn test_missing_interval_falls_back_to_default() {
        let settings = ThrottleSettings::default();
        assert_eq!(settings.interval(), Ok(Duration::from_millis(DEFAULT_INTERVAL_MS)));
    }

    #[test]
    fn test_zero_interval_is_valid() {
        let settings = ThrottleSettings::with_interval_ms(0);
        assert_ok!(validate_settings(&settings));
        assert_eq!(settings.interval(), Ok(Duration::ZERO));
    }

    #[test]
    fn test_negative_interval_rejected() {
        let settings = ThrottleSettings::with_interval_ms(-1);
        assert_err!(validate_settings(&settings));
        assert_eq!(settings.interval(), Err(SettingsError::NegativeInterval(-1)));
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: ThrottleSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ThrottleSettings::default());

        let settings: ThrottleSettings = serde_json::from_str(r#"{"interval_ms": 250}"#).unwrap();
        assert_eq!(settings.interval(), Ok(Duration::from_millis(250)));
    }
}
