//! Automated requirement checks
//!
//! The engine does not own violation detection. A [`RequirementCheck`] is
//! injected at construction and every call is bounded by
//! [`run_check`]'s timeout, so one slow predicate cannot stall a tick.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, ComplianceResult};
use crate::framework::{Requirement, RequirementStatus};

/// Predicate deciding the current status of an automated requirement
#[async_trait]
pub trait RequirementCheck: Send + Sync {
    /// Check name for logging/debugging
    fn name(&self) -> &str;

    /// Determine the requirement's status
    ///
    /// Return `Err(_)` when the check itself could not run; the requirement
    /// is then treated as `not_met` for this tick.
    async fn check(
        &self,
        framework_id: &str,
        requirement: &Requirement,
    ) -> ComplianceResult<RequirementStatus>;
}

/// Why a check did not produce its own answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckFailure {
    TimedOut { timeout_ms: u64 },
    Failed { error: String },
}

/// Result of running one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub framework_id: String,
    pub requirement_id: String,
    pub status: RequirementStatus,
    pub failure: Option<CheckFailure>,
}

impl CheckOutcome {
    pub fn is_violation(&self) -> bool {
        self.status != RequirementStatus::Met
    }
}

/// Run `check` with a time budget. Timeouts and errors become `not_met`.
pub async fn run_check(
    check: &dyn RequirementCheck,
    framework_id: &str,
    requirement: &Requirement,
    timeout: Duration,
) -> CheckOutcome {
    let result = tokio::time::timeout(timeout, check.check(framework_id, requirement)).await;

    let (status, failure) = match result {
        Ok(Ok(status)) => {
            tracing::debug!(
                check = check.name(),
                framework = framework_id,
                requirement = %requirement.id,
                status = ?status,
                "Automated check completed"
            );
            (status, None)
        }
        Ok(Err(e)) => {
            tracing::warn!(
                check = check.name(),
                framework = framework_id,
                requirement = %requirement.id,
                error = %e,
                "Automated check failed, treating as not met"
            );
            (
                RequirementStatus::NotMet,
                Some(CheckFailure::Failed {
                    error: e.to_string(),
                }),
            )
        }
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            let err = ComplianceError::CheckTimeout {
                requirement: format!("{}/{}", framework_id, requirement.id),
                timeout_ms,
            };
            tracing::warn!(
                check = check.name(),
                error = %err,
                "Automated check timed out, treating as not met"
            );
            (RequirementStatus::NotMet, Some(CheckFailure::TimedOut { timeout_ms }))
        }
    };

    CheckOutcome {
        framework_id: framework_id.to_string(),
        requirement_id: requirement.id.clone(),
        status,
        failure,
    }
}

/// Reports the status already stored on the requirement
///
/// Used when no live integration is wired in: deadlines are still tracked
/// and manually reviewed statuses still raise violation alerts.
pub struct StoredStatusCheck;

#[async_trait]
impl RequirementCheck for StoredStatusCheck {
    fn name(&self) -> &str {
        "StoredStatus"
    }

    async fn check(
        &self,
        _framework_id: &str,
        requirement: &Requirement,
    ) -> ComplianceResult<RequirementStatus> {
        Ok(requirement.status)
    }
}

/// Fixed outcomes per `framework/requirement`, falling back to the stored status
#[derive(Default)]
pub struct StaticCheck {
    outcomes: RwLock<HashMap<String, RequirementStatus>>,
}

impl StaticCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the outcome for a requirement
    pub fn set(&self, framework_id: &str, requirement_id: &str, status: RequirementStatus) {
        if let Ok(mut outcomes) = self.outcomes.write() {
            outcomes.insert(format!("{framework_id}/{requirement_id}"), status);
        }
    }

    fn get(&self, framework_id: &str, requirement_id: &str) -> Option<RequirementStatus> {
        self.outcomes
            .read()
            .ok()
            .and_then(|o| o.get(&format!("{framework_id}/{requirement_id}")).copied())
    }
}

#[async_trait]
impl RequirementCheck for StaticCheck {
    fn name(&self) -> &str {
        "Static"
    }

    async fn check(
        &self,
        framework_id: &str,
        requirement: &Requirement,
    ) -> ComplianceResult<RequirementStatus> {
        Ok(self
            .get(framework_id, &requirement.id)
            .unwrap_or(requirement.status))
    }
}
