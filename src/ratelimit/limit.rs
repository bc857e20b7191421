//! Limit configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, WindowgateError};

/// Default quota.
const DEFAULT_QUOTA: u64 = 5;
/// Default window length in seconds.
const DEFAULT_WINDOW_SECS: u64 = 5;

/// An immutable, validated rate limit: at most `quota` requests per client
/// within any rolling `window`.
///
/// The window is counted in whole seconds, so sub-second windows cannot be
/// expressed and are rejected by [`Limit::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    quota: u64,
    window: Duration,
}

impl Limit {
    /// Create a new limit, rejecting a zero quota and zero or fractional windows.
    pub fn new(quota: u64, window: Duration) -> Result<Self> {
        if quota == 0 {
            return Err(WindowgateError::Config(
                "quota must be at least 1".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(WindowgateError::Config(
                "window must be greater than zero".to_string(),
            ));
        }
        if window.subsec_nanos() != 0 {
            return Err(WindowgateError::Config(format!(
                "window must be a whole number of seconds, got {:?}",
                window
            )));
        }
        Ok(Self { quota, window })
    }

    /// Shorthand for a limit over a window of whole seconds.
    pub fn per_secs(quota: u64, window_secs: u64) -> Result<Self> {
        Self::new(quota, Duration::from_secs(window_secs))
    }

    /// Maximum admitted requests per window.
    pub fn quota(&self) -> u64 {
        self.quota
    }

    /// The rolling period the quota applies to.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The window in whole seconds.
    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self {
            quota: DEFAULT_QUOTA,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}

/// Unvalidated limit settings as they appear in configuration sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Maximum requests per window
    #[serde(default = "default_quota")]
    pub quota: u64,
    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            quota: default_quota(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_quota() -> u64 {
    DEFAULT_QUOTA
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}

impl TryFrom<LimitSettings> for Limit {
    type Error = WindowgateError;

    fn try_from(settings: LimitSettings) -> Result<Self> {
        Limit::per_secs(settings.quota, settings.window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_limit() {
        let limit = Limit::per_secs(10, 1).unwrap();
        assert_eq!(limit.quota(), 10);
        assert_eq!(limit.window(), Duration::from_secs(1));
        assert_eq!(limit.window_secs(), 1);
    }

    #[test]
    fn test_zero_quota_rejected() {
        let err = Limit::per_secs(0, 1).unwrap_err();
        assert!(matches!(err, WindowgateError::Config(_)));
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(Limit::new(10, Duration::ZERO).is_err());
    }

    #[test]
    fn test_sub_second_window_rejected() {
        assert!(Limit::new(10, Duration::from_millis(500)).is_err());
        assert!(Limit::new(10, Duration::from_millis(1500)).is_err());
    }

    #[test]
    fn test_default_limit() {
        let limit = Limit::default();
        assert_eq!(limit.quota(), 5);
        assert_eq!(limit.window_secs(), 5);
        assert_eq!(Limit::try_from(LimitSettings::default()).unwrap(), limit);
    }

    #[test]
    fn test_settings_from_yaml() {
        let settings: LimitSettings = serde_yaml::from_str("quota: 60\n").unwrap();
        assert_eq!(settings.quota, 60);
        assert_eq!(settings.window_secs, 5);

        let invalid: LimitSettings = serde_yaml::from_str("quota: 0\nwindow_secs: 1\n").unwrap();
        assert!(Limit::try_from(invalid).is_err());
    }
}
