//! Compliance Engine - Main orchestrator
//!
//! Constructed once at process start and shared as `Arc<ComplianceEngine>`.
//! Coordinates rule evaluation, requirement checks, alert raising, reports
//! and ledger writes.
//!
//! Locking: `frameworks` is always acquired before `journal`. The journal
//! mutex covers the alert log and the ledger, so the dedup check and the
//! insert of an alert happen atomically even under concurrent ticks.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pulse_core::Jurisdiction;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};

use crate::alert::{Alert, AlertLog, RaiseOutcome};
use crate::check::{run_check, CheckFailure, CheckOutcome, RequirementCheck, StoredStatusCheck};
use crate::config::ComplianceConfig;
use crate::error::{ComplianceError, ComplianceResult};
use crate::evaluator::{evaluate, Evaluation, TransactionRequest};
use crate::event::{ComplianceEvent, UpdateSource};
use crate::framework::{Framework, FrameworkSnapshot, Requirement, RequirementStatus};
use crate::generator::{AlertGenerator, TickSummary};
use crate::ledger::ComplianceLedger;
use crate::report::{ComplianceReport, ReportBuilder};
use crate::rules::RuleStore;
use crate::scorer::{ScoreThresholds, Scorer};

/// Alert log and ledger, guarded together
struct Journal {
    alerts: AlertLog,
    ledger: ComplianceLedger,
}

impl Journal {
    /// Raise `alert` unless an open alert with the same key exists
    ///
    /// A new alert is appended to the ledger before it enters the log, so a
    /// failed write leaves the dedup index untouched.
    fn raise(&mut self, alert: Alert) -> ComplianceResult<RaiseOutcome> {
        if !self.alerts.is_open(&alert.key()) {
            self.ledger.append(&ComplianceEvent::alert_raised(alert.clone()))?;
        }

        let outcome = self.alerts.raise(alert);
        match &outcome {
            RaiseOutcome::Raised(alert) => {
                tracing::info!(
                    alert_id = %alert.id,
                    framework = %alert.framework,
                    requirement = %alert.requirement,
                    alert_type = ?alert.alert_type,
                    severity = %alert.severity,
                    "Alert raised"
                );
            }
            RaiseOutcome::Suppressed { existing_id } => {
                tracing::debug!(existing_id = %existing_id, "Duplicate alert suppressed");
            }
        }
        Ok(outcome)
    }
}

/// Check outcome waiting to be applied, with the requirement state it was
/// computed from
struct PendingOutcome {
    outcome: CheckOutcome,
    observed: (RequirementStatus, Option<DateTime<Utc>>),
    violation: Option<Alert>,
}

/// Builder for [`ComplianceEngine`]
pub struct EngineBuilder {
    config: ComplianceConfig,
    rules: RuleStore,
    frameworks: Vec<Framework>,
    check: Arc<dyn RequirementCheck>,
    ledger: ComplianceLedger,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: ComplianceConfig::default(),
            rules: RuleStore::default(),
            frameworks: Vec::new(),
            check: Arc::new(StoredStatusCheck),
            ledger: ComplianceLedger::in_memory(),
        }
    }
}

impl EngineBuilder {
    pub fn config(mut self, config: ComplianceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rules(mut self, rules: RuleStore) -> Self {
        self.rules = rules;
        self
    }

    pub fn frameworks(mut self, frameworks: impl IntoIterator<Item = Framework>) -> Self {
        self.frameworks.extend(frameworks);
        self
    }

    pub fn framework(mut self, framework: Framework) -> Self {
        self.frameworks.push(framework);
        self
    }

    /// Inject the automated-check predicate
    pub fn check(mut self, check: Arc<dyn RequirementCheck>) -> Self {
        self.check = check;
        self
    }

    pub fn ledger(mut self, ledger: ComplianceLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Validate inputs, replay the ledger and record the loaded rule set
    pub fn build(self) -> ComplianceResult<ComplianceEngine> {
        self.config.validate()?;

        let mut frameworks = BTreeMap::new();
        for framework in self.frameworks {
            framework.validate()?;
            let id = framework.id.clone();
            if frameworks.insert(id.clone(), framework).is_some() {
                return Err(ComplianceError::ConfigError(format!(
                    "duplicate framework id {id}"
                )));
            }
        }

        let mut journal = Journal {
            alerts: AlertLog::new(),
            ledger: self.ledger,
        };
        let replayed = replay(&mut frameworks, &mut journal)?;
        if replayed > 0 {
            tracing::info!(events = replayed, "Replayed compliance ledger");
        }

        let fingerprint = self.rules.fingerprint();
        tracing::info!(
            rules = self.rules.len(),
            fingerprint = %fingerprint,
            "Rule set loaded"
        );
        journal
            .ledger
            .append(&ComplianceEvent::rule_set_loaded(fingerprint, self.rules.len()))?;

        let scorer = Scorer::new(ScoreThresholds::from(&self.config));

        Ok(ComplianceEngine {
            generator: AlertGenerator::new(self.config.deadline_warning()),
            reports: ReportBuilder::new(scorer, self.config.recent_alert_limit),
            scorer,
            config: self.config,
            rules: self.rules,
            check: self.check,
            frameworks: RwLock::new(frameworks),
            journal: Mutex::new(journal),
            replayed,
        })
    }
}

/// Rebuild framework and alert state from ledger events
fn replay(
    frameworks: &mut BTreeMap<String, Framework>,
    journal: &mut Journal,
) -> ComplianceResult<usize> {
    let events = journal.ledger.read_all()?;
    let count = events.len();

    for event in events {
        match event {
            ComplianceEvent::RequirementUpdated {
                framework_id,
                requirement_id,
                status,
                timestamp,
                ..
            } => {
                let applied = frameworks
                    .get_mut(&framework_id)
                    .map(|f| f.set_status(&requirement_id, status, timestamp));
                if !matches!(applied, Some(Ok(_))) {
                    tracing::debug!(
                        framework = %framework_id,
                        requirement = %requirement_id,
                        "Skipping replay of update for unknown requirement"
                    );
                }
            }
            ComplianceEvent::RequirementSuperseded {
                framework_id,
                superseded_id,
                replacement,
                ..
            } => {
                if let Some(framework) = frameworks.get_mut(&framework_id) {
                    if framework.requirement(&replacement.id).is_none() {
                        if let Err(e) = framework.supersede(&superseded_id, replacement) {
                            tracing::debug!(error = %e, "Skipping replay of supersede");
                        }
                    }
                }
            }
            ComplianceEvent::AlertRaised { alert, .. } => journal.alerts.restore(alert),
            ComplianceEvent::AlertResolved {
                alert_id,
                timestamp,
                ..
            } => {
                if let Err(e) = journal.alerts.resolve(&alert_id, timestamp) {
                    tracing::debug!(error = %e, "Skipping replay of resolve");
                }
            }
            ComplianceEvent::RuleSetLoaded { .. }
            | ComplianceEvent::TransactionEvaluated { .. }
            | ComplianceEvent::ReportGenerated { .. } => {}
        }
    }

    Ok(count)
}

/// Main Compliance Engine
pub struct ComplianceEngine {
    config: ComplianceConfig,
    rules: RuleStore,
    scorer: Scorer,
    generator: AlertGenerator,
    reports: ReportBuilder,
    check: Arc<dyn RequirementCheck>,
    frameworks: RwLock<BTreeMap<String, Framework>>,
    journal: Mutex<Journal>,
    replayed: usize,
}

impl ComplianceEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Engine with built-in rules, no frameworks and an in-memory ledger
    pub fn in_memory() -> ComplianceResult<Self> {
        Self::builder().rules(RuleStore::builtin()).build()
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Number of ledger events replayed at construction
    pub fn replayed_events(&self) -> usize {
        self.replayed
    }

    // === Evaluator ===

    /// Validate a transaction from raw inbound values
    pub async fn validate(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
        transaction_type: &str,
    ) -> ComplianceResult<Evaluation> {
        let request = TransactionRequest::parse(from, to, amount, transaction_type)?;
        self.validate_transaction(&request).await
    }

    /// Validate a typed transaction request against the rule store
    pub async fn validate_transaction(
        &self,
        request: &TransactionRequest,
    ) -> ComplianceResult<Evaluation> {
        let evaluation = evaluate(&self.rules, request);

        if evaluation.is_config_gap() {
            tracing::warn!(
                key = %request.key(),
                "No rule configured, manual review required"
            );
        } else {
            tracing::debug!(
                key = %request.key(),
                amount = %request.amount,
                allowed = evaluation.allowed,
                warnings = evaluation.warnings.len(),
                "Transaction evaluated"
            );
        }

        let mut journal = self.journal.lock().await;
        journal
            .ledger
            .append(&ComplianceEvent::transaction_evaluated(*request, &evaluation))?;

        Ok(evaluation)
    }

    // === Alert Generator ===

    /// Run one scheduled tick at the current time
    pub async fn run_tick(&self) -> ComplianceResult<TickSummary> {
        self.run_tick_at(Utc::now()).await
    }

    /// Run one tick as of `now`
    ///
    /// Checks run against a snapshot without holding any lock; each is
    /// bounded by `check_timeout`. Failures are isolated per requirement.
    ///
    /// An outcome is applied only if the requirement still has the status
    /// and `last_checked` it had at snapshot time. Otherwise a review,
    /// supersede or another tick got there first and the outcome (with its
    /// violation alert) is dropped.
    pub async fn run_tick_at(&self, now: DateTime<Utc>) -> ComplianceResult<TickSummary> {
        let snapshot: Vec<Framework> = self.frameworks.read().await.values().cloned().collect();

        let mut summary = TickSummary::default();
        let mut deadline_alerts = Vec::new();
        let mut pending = Vec::new();

        for framework in &snapshot {
            for requirement in framework.active_requirements() {
                summary.requirements_scanned += 1;

                if let Some(alert) = self.generator.deadline_alert(framework, requirement, now) {
                    deadline_alerts.push(alert);
                }

                if !requirement.automated_check {
                    continue;
                }

                summary.checks_run += 1;
                let outcome = run_check(
                    self.check.as_ref(),
                    &framework.id,
                    requirement,
                    self.config.check_timeout(),
                )
                .await;

                match outcome.failure {
                    Some(CheckFailure::TimedOut { .. }) => summary.timed_out += 1,
                    Some(CheckFailure::Failed { .. }) => summary.failed += 1,
                    None => {}
                }

                pending.push(PendingOutcome {
                    violation: self
                        .generator
                        .violation_alert(framework, requirement, &outcome, now),
                    observed: (requirement.status, requirement.last_checked),
                    outcome,
                });
            }
        }

        let mut frameworks = self.frameworks.write().await;
        let mut journal = self.journal.lock().await;
        let mut candidates = deadline_alerts;

        for PendingOutcome {
            outcome,
            observed,
            violation,
        } in pending
        {
            let Some(framework) = frameworks.get_mut(&outcome.framework_id) else {
                continue;
            };
            let live = framework
                .requirement(&outcome.requirement_id)
                .filter(|r| r.is_active())
                .map(|r| (r.status, r.last_checked));
            if live != Some(observed) {
                tracing::debug!(
                    framework = %outcome.framework_id,
                    requirement = %outcome.requirement_id,
                    "Requirement changed during check, dropping stale outcome"
                );
                summary.stale_outcomes += 1;
                continue;
            }

            let previous = observed.0;
            if previous != outcome.status {
                let event = ComplianceEvent::requirement_updated(
                    &outcome.framework_id,
                    &outcome.requirement_id,
                    previous,
                    outcome.status,
                    UpdateSource::AutomatedCheck {
                        check: self.check.name().to_string(),
                    },
                    now,
                );
                if let Err(e) = journal.ledger.append(&event) {
                    tracing::error!(
                        framework = %outcome.framework_id,
                        requirement = %outcome.requirement_id,
                        error = %e,
                        "Failed to record status change, outcome not applied"
                    );
                    summary.ledger_failures += 1;
                    continue;
                }
                summary.status_changes += 1;
            }

            if let Err(e) = framework.set_status(&outcome.requirement_id, outcome.status, now) {
                tracing::debug!(error = %e, "Dropping check outcome");
                continue;
            }
            candidates.extend(violation);
        }

        for alert in candidates {
            match journal.raise(alert) {
                Ok(RaiseOutcome::Raised(_)) => summary.alerts_raised += 1,
                Ok(RaiseOutcome::Suppressed { .. }) => summary.duplicates_suppressed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to record alert, not raised");
                    summary.ledger_failures += 1;
                }
            }
        }

        tracing::debug!(
            scanned = summary.requirements_scanned,
            checks = summary.checks_run,
            raised = summary.alerts_raised,
            suppressed = summary.duplicates_suppressed,
            stale = summary.stale_outcomes,
            timed_out = summary.timed_out,
            failed = summary.failed,
            "Tick completed"
        );

        Ok(summary)
    }

    /// Resolve an alert by id
    pub async fn resolve_alert(&self, alert_id: &str) -> ComplianceResult<Alert> {
        let now = Utc::now();
        let mut journal = self.journal.lock().await;
        match journal.alerts.get(alert_id) {
            None => return Err(ComplianceError::AlertNotFound(alert_id.to_string())),
            Some(alert) if alert.resolved => {
                return Err(ComplianceError::AlertAlreadyResolved(alert_id.to_string()))
            }
            Some(_) => {}
        }
        journal
            .ledger
            .append(&ComplianceEvent::alert_resolved(alert_id, now))?;
        let alert = journal.alerts.resolve(alert_id, now)?;

        tracing::info!(alert_id = %alert_id, framework = %alert.framework, "Alert resolved");
        Ok(alert)
    }

    /// All alerts, in raise order
    pub async fn alerts(&self) -> Vec<Alert> {
        self.journal.lock().await.alerts.all().to_vec()
    }

    pub async fn open_alerts(&self) -> Vec<Alert> {
        self.journal.lock().await.alerts.open_alerts().cloned().collect()
    }

    /// Number of raises suppressed by deduplication
    pub async fn suppressed_alert_count(&self) -> u64 {
        self.journal.lock().await.alerts.suppressed_count()
    }

    // === Frameworks ===

    pub async fn framework_snapshots(&self) -> Vec<FrameworkSnapshot> {
        self.frameworks
            .read()
            .await
            .values()
            .map(|f| self.scorer.snapshot(f))
            .collect()
    }

    pub async fn framework(&self, framework_id: &str) -> ComplianceResult<FrameworkSnapshot> {
        self.frameworks
            .read()
            .await
            .get(framework_id)
            .map(|f| self.scorer.snapshot(f))
            .ok_or_else(|| ComplianceError::FrameworkNotFound(framework_id.to_string()))
    }

    /// Record a manual review outcome. Returns the previous status.
    pub async fn record_review(
        &self,
        framework_id: &str,
        requirement_id: &str,
        status: RequirementStatus,
        reviewer: &str,
    ) -> ComplianceResult<RequirementStatus> {
        let now = Utc::now();
        let mut frameworks = self.frameworks.write().await;
        let framework = frameworks
            .get_mut(framework_id)
            .ok_or_else(|| ComplianceError::FrameworkNotFound(framework_id.to_string()))?;

        let mut updated = framework.clone();
        let previous = updated.set_status(requirement_id, status, now)?;

        let mut journal = self.journal.lock().await;
        journal.ledger.append(&ComplianceEvent::requirement_updated(
            framework_id,
            requirement_id,
            previous,
            status,
            UpdateSource::ManualReview {
                reviewer: reviewer.to_string(),
            },
            now,
        ))?;
        *framework = updated;

        tracing::info!(
            framework = %framework_id,
            requirement = %requirement_id,
            previous = ?previous,
            status = ?status,
            reviewer = %reviewer,
            "Requirement reviewed"
        );
        Ok(previous)
    }

    /// Replace a requirement and raise an `update` alert for the replacement
    pub async fn supersede_requirement(
        &self,
        framework_id: &str,
        superseded_id: &str,
        replacement: Requirement,
    ) -> ComplianceResult<RaiseOutcome> {
        let now = Utc::now();
        let mut frameworks = self.frameworks.write().await;
        let framework = frameworks
            .get_mut(framework_id)
            .ok_or_else(|| ComplianceError::FrameworkNotFound(framework_id.to_string()))?;

        let mut updated = framework.clone();
        updated.supersede(superseded_id, replacement.clone())?;

        let superseded = updated
            .requirement(superseded_id)
            .cloned()
            .ok_or_else(|| ComplianceError::RequirementNotFound(superseded_id.to_string()))?;
        let alert = self
            .generator
            .update_alert(&updated, &superseded, &replacement, now);

        let mut journal = self.journal.lock().await;
        journal.ledger.append(&ComplianceEvent::requirement_superseded(
            framework_id,
            superseded_id,
            replacement,
            now,
        ))?;
        *framework = updated;
        journal.raise(alert)
    }

    // === Report Builder ===

    /// Build a report, optionally filtered by jurisdiction
    pub async fn build_report(
        &self,
        jurisdiction: Option<Jurisdiction>,
    ) -> ComplianceResult<ComplianceReport> {
        let now = Utc::now();
        let frameworks: Vec<Framework> = self.frameworks.read().await.values().cloned().collect();

        let mut journal = self.journal.lock().await;
        let report = self
            .reports
            .build(&frameworks, journal.alerts.all(), jurisdiction, now);

        journal.ledger.append(&ComplianceEvent::report_generated(
            jurisdiction,
            report.overall_score,
            report.frameworks.len(),
            now,
        ))?;

        Ok(report)
    }

    /// Build a report from a raw jurisdiction filter
    pub async fn report(&self, jurisdiction: Option<&str>) -> ComplianceResult<ComplianceReport> {
        let filter = jurisdiction
            .map(|j| {
                j.parse::<Jurisdiction>()
                    .map_err(|e| ComplianceError::invalid_input(e.to_string()))
            })
            .transpose()?;
        self.build_report(filter).await
    }
}
