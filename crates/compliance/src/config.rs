//! Compliance configuration with configurable thresholds
//!
//! Scoring thresholds and scheduling intervals are placeholders for real
//! business policy, so they live in configuration rather than in code.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ComplianceError, ComplianceResult};

/// Upper bound for `deadline_warning_days` (ten years)
pub const MAX_DEADLINE_WARNING_DAYS: i64 = 3650;

/// Configuration for the Compliance Engine
///
/// Every field has a serde default, so a partial JSON file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    // === Scoring ===
    /// Minimum score (0-100) for a framework to be `compliant`
    #[serde(default = "default_compliant_threshold")]
    pub compliant_threshold: u8,

    /// Scores below this floor are `non_compliant`
    #[serde(default = "default_non_compliant_floor")]
    pub non_compliant_floor: u8,

    // === Alert Generator ===
    /// Interval between scheduled ticks (in seconds)
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Time budget for a single automated check
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,

    /// How close to `next_review` a requirement counts as approaching its deadline
    #[serde(default = "default_deadline_warning_days")]
    pub deadline_warning_days: i64,

    // === Reports ===
    /// Maximum number of alerts included in a report
    #[serde(default = "default_recent_alert_limit")]
    pub recent_alert_limit: usize,
}

fn default_compliant_threshold() -> u8 {
    90
}

fn default_non_compliant_floor() -> u8 {
    70
}

fn default_tick_interval_secs() -> u64 {
    300 // 5 minutes
}

fn default_check_timeout_ms() -> u64 {
    500
}

fn default_deadline_warning_days() -> i64 {
    14
}

fn default_recent_alert_limit() -> usize {
    20
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            compliant_threshold: default_compliant_threshold(),
            non_compliant_floor: default_non_compliant_floor(),
            tick_interval_secs: default_tick_interval_secs(),
            check_timeout_ms: default_check_timeout_ms(),
            deadline_warning_days: default_deadline_warning_days(),
            recent_alert_limit: default_recent_alert_limit(),
        }
    }
}

impl ComplianceConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> ComplianceResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject threshold combinations the scorer cannot honor
    pub fn validate(&self) -> ComplianceResult<()> {
        if self.compliant_threshold > 100 {
            return Err(ComplianceError::ConfigError(format!(
                "compliant_threshold must be <= 100, got {}",
                self.compliant_threshold
            )));
        }
        if self.non_compliant_floor > self.compliant_threshold {
            return Err(ComplianceError::ConfigError(format!(
                "non_compliant_floor ({}) exceeds compliant_threshold ({})",
                self.non_compliant_floor, self.compliant_threshold
            )));
        }
        if self.tick_interval_secs == 0 {
            return Err(ComplianceError::ConfigError(
                "tick_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.check_timeout_ms == 0 {
            return Err(ComplianceError::ConfigError(
                "check_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if !(0..=MAX_DEADLINE_WARNING_DAYS).contains(&self.deadline_warning_days) {
            return Err(ComplianceError::ConfigError(format!(
                "deadline_warning_days must be between 0 and {}, got {}",
                MAX_DEADLINE_WARNING_DAYS, self.deadline_warning_days
            )));
        }
        Ok(())
    }

    /// Get tick interval as Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Get check timeout as Duration
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    /// Get deadline warning window as chrono Duration
    pub fn deadline_warning(&self) -> chrono::Duration {
        chrono::Duration::days(self.deadline_warning_days.clamp(0, MAX_DEADLINE_WARNING_DAYS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComplianceConfig::default();

        assert_eq!(config.compliant_threshold, 90);
        assert_eq!(config.non_compliant_floor, 70);
        assert_eq!(config.tick_interval_secs, 300);
        assert_eq!(config.check_timeout_ms, 500);
        assert_eq!(config.deadline_warning_days, 14);
        assert_eq!(config.recent_alert_limit, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "compliant_threshold": 95 }"#;
        let config: ComplianceConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.compliant_threshold, 95);
        assert_eq!(config.non_compliant_floor, 70); // default
    }

    #[test]
    fn test_floor_above_threshold_rejected() {
        let config = ComplianceConfig {
            compliant_threshold: 60,
            non_compliant_floor: 70,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ComplianceError::ConfigError(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ComplianceConfig {
            tick_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadline_warning_bounds() {
        let huge = ComplianceConfig {
            deadline_warning_days: 100_000_000,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(ComplianceError::ConfigError(_))));
        assert_eq!(
            huge.deadline_warning(),
            chrono::Duration::days(MAX_DEADLINE_WARNING_DAYS)
        );

        let negative = ComplianceConfig {
            deadline_warning_days: -1,
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let max = ComplianceConfig {
            deadline_warning_days: MAX_DEADLINE_WARNING_DAYS,
            ..Default::default()
        };
        assert!(max.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "check_timeout_ms": 250, "tick_interval_secs": 60 }"#).unwrap();

        let config = ComplianceConfig::from_file(&path).unwrap();
        assert_eq!(config.check_timeout(), Duration::from_millis(250));
        assert_eq!(config.tick_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "compliant_threshold": 120 }"#).unwrap();

        assert!(matches!(
            ComplianceConfig::from_file(&path),
            Err(ComplianceError::ConfigError(_))
        ));
    }

    #[test]
    fn test_duration_helpers() {
        let config = ComplianceConfig::default();

        assert_eq!(config.tick_interval(), Duration::from_secs(300));
        assert_eq!(config.check_timeout(), Duration::from_millis(500));
        assert_eq!(config.deadline_warning(), chrono::Duration::days(14));
    }
}
