//! Evaluator - applies a transaction to the rule set
//!
//! Pure function of the request and the current rule snapshot. A missing
//! rule never silently allows: it becomes a [`EvaluationOutcome::ConfigGap`],
//! kept distinct from a [`EvaluationOutcome::Denied`] policy decision.

use pulse_core::{Amount, Jurisdiction, TransactionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, ComplianceResult};
use crate::rules::{Rule, RuleKey, RuleStore};

/// A validated transaction-validation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Jurisdiction,
    pub to: Jurisdiction,
    pub amount: Amount,
    pub transaction_type: TransactionType,
}

impl TransactionRequest {
    /// Create a request from typed parts. The amount must be positive.
    pub fn new(
        from: Jurisdiction,
        to: Jurisdiction,
        amount: Decimal,
        transaction_type: TransactionType,
    ) -> ComplianceResult<Self> {
        let amount =
            Amount::positive(amount).map_err(|e| ComplianceError::invalid_input(e.to_string()))?;
        Ok(Self {
            from,
            to,
            amount,
            transaction_type,
        })
    }

    /// Parse a request from raw inbound values
    ///
    /// Rejects unknown jurisdictions, unknown transaction types and
    /// non-positive amounts before any rule lookup happens.
    pub fn parse(
        from: &str,
        to: &str,
        amount: Decimal,
        transaction_type: &str,
    ) -> ComplianceResult<Self> {
        let from: Jurisdiction = from
            .parse()
            .map_err(|e| ComplianceError::invalid_input(format!("from: {e}")))?;
        let to: Jurisdiction = to
            .parse()
            .map_err(|e| ComplianceError::invalid_input(format!("to: {e}")))?;
        let transaction_type: TransactionType = transaction_type
            .parse()
            .map_err(|e| ComplianceError::invalid_input(format!("{e}")))?;

        Self::new(from, to, amount, transaction_type)
    }

    pub fn key(&self) -> RuleKey {
        RuleKey::new(self.from, self.to, self.transaction_type)
    }
}

/// Outcome of evaluating a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    /// Amount lies within the rule's bounds
    Permitted,
    /// Rule exists and the amount falls outside it (policy decision)
    Denied { reason: String },
    /// No rule exists for the key (configuration gap)
    ConfigGap { reason: String },
}

/// Result of a transaction evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub outcome: EvaluationOutcome,
    pub allowed: bool,
    /// Documents or actions the transaction requires
    pub requirements: Vec<String>,
    pub warnings: Vec<String>,
    pub restrictions: Vec<String>,
    pub tax_implications: Option<String>,
    /// Version of the rule that decided this evaluation
    pub rule_version: Option<u32>,
}

impl Evaluation {
    fn config_gap(key: RuleKey) -> Self {
        let reason = format!("no rule configured for {key}");
        Self {
            requirements: vec![format!(
                "Manual review required: {reason}; compliance team must approve before execution"
            )],
            outcome: EvaluationOutcome::ConfigGap { reason },
            allowed: false,
            warnings: Vec::new(),
            restrictions: Vec::new(),
            tax_implications: None,
            rule_version: None,
        }
    }

    pub fn is_config_gap(&self) -> bool {
        matches!(self.outcome, EvaluationOutcome::ConfigGap { .. })
    }

    pub fn is_denied(&self) -> bool {
        matches!(self.outcome, EvaluationOutcome::Denied { .. })
    }

    /// Convert into a `Result` for callers that treat anything but
    /// `Permitted` as an error.
    pub fn into_result(self, request: &TransactionRequest) -> ComplianceResult<Self> {
        match &self.outcome {
            EvaluationOutcome::Permitted => Ok(self),
            EvaluationOutcome::Denied { reason } => {
                Err(ComplianceError::TransactionDenied(reason.clone()))
            }
            EvaluationOutcome::ConfigGap { .. } => Err(ComplianceError::RuleNotFound {
                from: request.from,
                to: request.to,
                transaction_type: request.transaction_type,
            }),
        }
    }
}

/// Evaluate a transaction against the rule store
pub fn evaluate(store: &RuleStore, request: &TransactionRequest) -> Evaluation {
    match store.lookup(request.from, request.to, request.transaction_type) {
        Ok(rule) => evaluate_rule(rule, request),
        Err(_) => Evaluation::config_gap(request.key()),
    }
}

fn evaluate_rule(rule: &Rule, request: &TransactionRequest) -> Evaluation {
    let amount = request.amount.value();
    let key = rule.key();

    let outcome = if amount < rule.min_amount.value() {
        EvaluationOutcome::Denied {
            reason: format!(
                "Amount {} is below minimum {} for {}",
                amount, rule.min_amount, key
            ),
        }
    } else if amount > rule.max_amount.value() {
        EvaluationOutcome::Denied {
            reason: format!(
                "Amount {} exceeds maximum {} for {}",
                amount, rule.max_amount, key
            ),
        }
    } else {
        EvaluationOutcome::Permitted
    };

    // Reporting applies whether or not the transaction is allowed.
    let mut warnings = Vec::new();
    if rule.requires_report(amount) {
        warnings.push(format!(
            "Amount {} meets reporting threshold {} for {}; regulatory report required",
            amount, rule.reporting_threshold, key
        ));
    }

    let tax_implications = if rule.tax_implications.is_empty() {
        None
    } else {
        Some(rule.tax_implications.clone())
    };

    Evaluation {
        allowed: outcome == EvaluationOutcome::Permitted,
        outcome,
        requirements: rule.required_documents.clone(),
        warnings,
        restrictions: rule.restrictions.clone(),
        tax_implications,
        rule_version: Some(rule.version),
    }
}
