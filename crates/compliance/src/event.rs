//! Compliance events (written to the Compliance Ledger)
//!
//! The ledger is the hand-off point to durable storage: framework, requirement
//! and alert state can be rebuilt by replaying these events.

use chrono::{DateTime, Utc};
use pulse_core::Jurisdiction;
use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::evaluator::{Evaluation, EvaluationOutcome, TransactionRequest};
use crate::framework::{Requirement, RequirementStatus};

/// Who changed a requirement status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateSource {
    AutomatedCheck { check: String },
    ManualReview { reviewer: String },
}

/// Events appended to the Compliance Ledger (append-only JSONL)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ComplianceEvent {
    /// Rule store loaded at startup
    RuleSetLoaded {
        id: String,
        rule_set_hash: String,
        rule_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Transaction validated against the rule store
    TransactionEvaluated {
        id: String,
        request: TransactionRequest,
        outcome: EvaluationOutcome,
        warnings: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Requirement status changed by a check or a review
    RequirementUpdated {
        id: String,
        framework_id: String,
        requirement_id: String,
        previous: RequirementStatus,
        status: RequirementStatus,
        source: UpdateSource,
        timestamp: DateTime<Utc>,
    },

    /// Requirement replaced by a newer one
    RequirementSuperseded {
        id: String,
        framework_id: String,
        superseded_id: String,
        replacement: Requirement,
        timestamp: DateTime<Utc>,
    },

    /// Alert raised by the generator
    AlertRaised { id: String, alert: Alert },

    /// Alert resolved by an operator
    AlertResolved {
        id: String,
        alert_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Report built
    ReportGenerated {
        id: String,
        jurisdiction: Option<Jurisdiction>,
        overall_score: u8,
        framework_count: usize,
        timestamp: DateTime<Utc>,
    },
}

fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

impl ComplianceEvent {
    /// Get the event ID
    pub fn id(&self) -> &str {
        match self {
            ComplianceEvent::RuleSetLoaded { id, .. } => id,
            ComplianceEvent::TransactionEvaluated { id, .. } => id,
            ComplianceEvent::RequirementUpdated { id, .. } => id,
            ComplianceEvent::RequirementSuperseded { id, .. } => id,
            ComplianceEvent::AlertRaised { id, .. } => id,
            ComplianceEvent::AlertResolved { id, .. } => id,
            ComplianceEvent::ReportGenerated { id, .. } => id,
        }
    }

    /// Get the timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ComplianceEvent::RuleSetLoaded { timestamp, .. } => *timestamp,
            ComplianceEvent::TransactionEvaluated { timestamp, .. } => *timestamp,
            ComplianceEvent::RequirementUpdated { timestamp, .. } => *timestamp,
            ComplianceEvent::RequirementSuperseded { timestamp, .. } => *timestamp,
            ComplianceEvent::AlertRaised { alert, .. } => alert.timestamp,
            ComplianceEvent::AlertResolved { timestamp, .. } => *timestamp,
            ComplianceEvent::ReportGenerated { timestamp, .. } => *timestamp,
        }
    }

    /// Get the framework ID if applicable
    pub fn framework_id(&self) -> Option<&str> {
        match self {
            ComplianceEvent::RequirementUpdated { framework_id, .. } => Some(framework_id),
            ComplianceEvent::RequirementSuperseded { framework_id, .. } => Some(framework_id),
            ComplianceEvent::AlertRaised { alert, .. } => Some(&alert.framework),
            _ => None,
        }
    }

    pub fn rule_set_loaded(rule_set_hash: impl Into<String>, rule_count: usize) -> Self {
        ComplianceEvent::RuleSetLoaded {
            id: new_id(),
            rule_set_hash: rule_set_hash.into(),
            rule_count,
            timestamp: Utc::now(),
        }
    }

    pub fn transaction_evaluated(request: TransactionRequest, evaluation: &Evaluation) -> Self {
        ComplianceEvent::TransactionEvaluated {
            id: new_id(),
            request,
            outcome: evaluation.outcome.clone(),
            warnings: evaluation.warnings.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn requirement_updated(
        framework_id: impl Into<String>,
        requirement_id: impl Into<String>,
        previous: RequirementStatus,
        status: RequirementStatus,
        source: UpdateSource,
        timestamp: DateTime<Utc>,
    ) -> Self {
        ComplianceEvent::RequirementUpdated {
            id: new_id(),
            framework_id: framework_id.into(),
            requirement_id: requirement_id.into(),
            previous,
            status,
            source,
            timestamp,
        }
    }

    pub fn requirement_superseded(
        framework_id: impl Into<String>,
        superseded_id: impl Into<String>,
        replacement: Requirement,
        timestamp: DateTime<Utc>,
    ) -> Self {
        ComplianceEvent::RequirementSuperseded {
            id: new_id(),
            framework_id: framework_id.into(),
            superseded_id: superseded_id.into(),
            replacement,
            timestamp,
        }
    }

    pub fn alert_raised(alert: Alert) -> Self {
        ComplianceEvent::AlertRaised { id: new_id(), alert }
    }

    pub fn alert_resolved(alert_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        ComplianceEvent::AlertResolved {
            id: new_id(),
            alert_id: alert_id.into(),
            timestamp,
        }
    }

    pub fn report_generated(
        jurisdiction: Option<Jurisdiction>,
        overall_score: u8,
        framework_count: usize,
        timestamp: DateTime<Utc>,
    ) -> Self {
        ComplianceEvent::ReportGenerated {
            id: new_id(),
            jurisdiction,
            overall_score,
            framework_count,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertType;
    use crate::evaluator::evaluate;
    use crate::rules::RuleStore;
    use pulse_core::Severity;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transaction_evaluated_serialization() {
        let request = TransactionRequest::parse("US", "EU", dec!(15000), "payment").unwrap();
        let evaluation = evaluate(&RuleStore::builtin(), &request);
        let event = ComplianceEvent::transaction_evaluated(request, &evaluation);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"transaction_evaluated\""));
        assert!(json.contains("\"kind\":\"denied\""));

        let parsed: ComplianceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_alert_raised_roundtrip() {
        let alert = Alert::new("gdpr", "r1", AlertType::Deadline, Severity::Medium, "due", Utc::now());
        let event = ComplianceEvent::alert_raised(alert.clone());

        let json = serde_json::to_string(&event).unwrap();
        let parsed: ComplianceEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.framework_id(), Some("gdpr"));
        assert_eq!(parsed.timestamp(), alert.timestamp);
        match parsed {
            ComplianceEvent::AlertRaised { alert: restored, .. } => assert_eq!(restored, alert),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_requirement_updated_source_tagged() {
        let event = ComplianceEvent::requirement_updated(
            "sox",
            "sox-404",
            RequirementStatus::Partial,
            RequirementStatus::Met,
            UpdateSource::ManualReview {
                reviewer: "auditor-1".to_string(),
            },
            Utc::now(),
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"manual_review\""));
        assert!(json.contains("\"previous\":\"partial\""));
        assert!(!event.id().is_empty());
    }
}
