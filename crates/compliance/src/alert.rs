//! Alerts and the append-only alert log
//!
//! The only mutation an alert ever sees is resolution. While an alert is
//! unresolved, raising another one with the same
//! `(framework, requirement, alert_type)` key is suppressed and counted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pulse_core::Severity;
use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, ComplianceResult};

/// Kind of detected condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Violation,
    Deadline,
    Update,
}

impl AlertType {
    /// Static remediation template per alert type
    pub fn action_template(&self) -> &'static [&'static str] {
        match self {
            AlertType::Violation => &[
                "Investigate the failing control",
                "Remediate the requirement",
                "Attach remediation evidence for audit",
            ],
            AlertType::Deadline => &[
                "Schedule the compliance review",
                "Collect updated evidence",
                "Confirm the next review date",
            ],
            AlertType::Update => &[
                "Review the updated requirement",
                "Assess impact on existing controls",
            ],
        }
    }
}

/// Deduplication key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    pub framework: String,
    pub requirement: String,
    pub alert_type: AlertType,
}

/// A time-stamped, resolvable notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub framework: String,
    pub requirement: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    pub action_required: Vec<String>,
}

impl Alert {
    /// Create a new unresolved alert with the type's action template
    pub fn new(
        framework: impl Into<String>,
        requirement: impl Into<String>,
        alert_type: AlertType,
        severity: Severity,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            framework: framework.into(),
            requirement: requirement.into(),
            alert_type,
            severity,
            message: message.into(),
            timestamp,
            resolved: false,
            resolved_at: None,
            action_required: alert_type
                .action_template()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn key(&self) -> AlertKey {
        AlertKey {
            framework: self.framework.clone(),
            requirement: self.requirement.clone(),
            alert_type: self.alert_type,
        }
    }
}

/// Outcome of raising an alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaiseOutcome {
    Raised(Alert),
    /// An unresolved alert with the same key already exists
    Suppressed { existing_id: String },
}

impl RaiseOutcome {
    pub fn is_raised(&self) -> bool {
        matches!(self, RaiseOutcome::Raised(_))
    }
}

/// Append-only alert log with an open-alert index
#[derive(Debug, Default)]
pub struct AlertLog {
    alerts: Vec<Alert>,
    by_id: HashMap<String, usize>,
    open: HashMap<AlertKey, usize>,
    suppressed: u64,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `alert` unless an unresolved alert with the same key exists
    pub fn raise(&mut self, alert: Alert) -> RaiseOutcome {
        let key = alert.key();
        if let Some(&idx) = self.open.get(&key) {
            self.suppressed += 1;
            return RaiseOutcome::Suppressed {
                existing_id: self.alerts[idx].id.clone(),
            };
        }

        let idx = self.alerts.len();
        self.by_id.insert(alert.id.clone(), idx);
        self.open.insert(key, idx);
        self.alerts.push(alert.clone());
        RaiseOutcome::Raised(alert)
    }

    /// Re-insert an alert read back from the ledger, resolved or not
    pub fn restore(&mut self, alert: Alert) {
        if self.by_id.contains_key(&alert.id) {
            return;
        }
        let idx = self.alerts.len();
        self.by_id.insert(alert.id.clone(), idx);
        if !alert.resolved {
            self.open.insert(alert.key(), idx);
        }
        self.alerts.push(alert);
    }

    /// Mark an alert resolved
    pub fn resolve(&mut self, alert_id: &str, at: DateTime<Utc>) -> ComplianceResult<Alert> {
        let idx = *self
            .by_id
            .get(alert_id)
            .ok_or_else(|| ComplianceError::AlertNotFound(alert_id.to_string()))?;

        let alert = &mut self.alerts[idx];
        if alert.resolved {
            return Err(ComplianceError::AlertAlreadyResolved(alert_id.to_string()));
        }
        alert.resolved = true;
        alert.resolved_at = Some(at);

        let key = alert.key();
        let resolved = alert.clone();
        self.open.remove(&key);
        Ok(resolved)
    }

    pub fn get(&self, alert_id: &str) -> Option<&Alert> {
        self.by_id.get(alert_id).map(|&idx| &self.alerts[idx])
    }

    pub fn is_open(&self, key: &AlertKey) -> bool {
        self.open.contains_key(key)
    }

    /// All alerts in insertion order
    pub fn all(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn open_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| !a.resolved)
    }

    /// Up to `limit` alerts, newest first
    pub fn recent(&self, limit: usize) -> Vec<&Alert> {
        let mut alerts: Vec<&Alert> = self.alerts.iter().collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        alerts.truncate(limit);
        alerts
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Number of raises suppressed by deduplication
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
