//! Alert Generator - turns requirement state into candidate alerts
//!
//! Per requirement deadline state machine, driven by wall-clock time:
//!
//! ```text
//! OK ──(now >= next_review - warning)──► APPROACHING_DEADLINE ──(now > next_review)──► OVERDUE
//! ```
//!
//! The generator only builds candidates. Deduplication happens when the
//! engine raises them on the [`crate::alert::AlertLog`].

use chrono::{DateTime, Duration, Utc};
use pulse_core::Severity;
use serde::{Deserialize, Serialize};

use crate::alert::{Alert, AlertType};
use crate::check::{CheckFailure, CheckOutcome};
use crate::framework::{Framework, Requirement};

/// Deadline state of a requirement at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineState {
    Ok,
    ApproachingDeadline,
    Overdue,
}

impl DeadlineState {
    pub fn at(next_review: DateTime<Utc>, now: DateTime<Utc>, warning: Duration) -> Self {
        if now > next_review {
            return DeadlineState::Overdue;
        }
        // A window reaching past the representable range is always open.
        match next_review.checked_sub_signed(warning) {
            Some(window_start) if now < window_start => DeadlineState::Ok,
            _ => DeadlineState::ApproachingDeadline,
        }
    }
}

/// Counters for one tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Active requirements looked at for deadlines
    pub requirements_scanned: usize,
    /// Automated checks run
    pub checks_run: usize,
    pub alerts_raised: usize,
    pub duplicates_suppressed: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub status_changes: usize,
    /// Outcomes dropped because the requirement changed while its check ran
    pub stale_outcomes: usize,
    /// Status changes or alerts dropped because the ledger write failed
    pub ledger_failures: usize,
}

/// Builds candidate alerts from requirement state and check outcomes
#[derive(Debug, Clone, Copy)]
pub struct AlertGenerator {
    deadline_warning: Duration,
}

impl AlertGenerator {
    pub fn new(deadline_warning: Duration) -> Self {
        Self { deadline_warning }
    }

    pub fn deadline_state(&self, requirement: &Requirement, now: DateTime<Utc>) -> DeadlineState {
        DeadlineState::at(requirement.next_review, now, self.deadline_warning)
    }

    /// Deadline alert for a requirement, if it is approaching or overdue
    ///
    /// Overdue alerts carry the requirement's severity; approaching alerts
    /// are capped at medium.
    pub fn deadline_alert(
        &self,
        framework: &Framework,
        requirement: &Requirement,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let (severity, message) = match self.deadline_state(requirement, now) {
            DeadlineState::Ok => return None,
            DeadlineState::ApproachingDeadline => (
                requirement.severity.min(Severity::Medium),
                format!(
                    "{}: review of '{}' due {}",
                    framework.name,
                    requirement.title,
                    requirement.next_review.format("%Y-%m-%d")
                ),
            ),
            DeadlineState::Overdue => (
                requirement.severity,
                format!(
                    "{}: review of '{}' overdue since {}",
                    framework.name,
                    requirement.title,
                    requirement.next_review.format("%Y-%m-%d")
                ),
            ),
        };

        Some(Alert::new(
            &framework.id,
            &requirement.id,
            AlertType::Deadline,
            severity,
            message,
            now,
        ))
    }

    /// Violation alert when an automated check did not report `met`
    pub fn violation_alert(
        &self,
        framework: &Framework,
        requirement: &Requirement,
        outcome: &CheckOutcome,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        if !outcome.is_violation() {
            return None;
        }

        let detail = match &outcome.failure {
            None => format!("status {:?}", outcome.status),
            Some(CheckFailure::TimedOut { timeout_ms }) => {
                format!("check timed out after {timeout_ms}ms")
            }
            Some(CheckFailure::Failed { error }) => format!("check failed: {error}"),
        };

        Some(Alert::new(
            &framework.id,
            &requirement.id,
            AlertType::Violation,
            requirement.severity,
            format!(
                "{}: '{}' is not met ({})",
                framework.name, requirement.title, detail
            ),
            now,
        ))
    }

    /// Update alert when a requirement is superseded
    pub fn update_alert(
        &self,
        framework: &Framework,
        superseded: &Requirement,
        replacement: &Requirement,
        now: DateTime<Utc>,
    ) -> Alert {
        Alert::new(
            &framework.id,
            &replacement.id,
            AlertType::Update,
            replacement.severity,
            format!(
                "{}: '{}' superseded by '{}'",
                framework.name, superseded.title, replacement.title
            ),
            now,
        )
    }
}
