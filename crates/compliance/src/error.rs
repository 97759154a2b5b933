//! Compliance errors

use pulse_core::{Jurisdiction, TransactionType};
use thiserror::Error;

/// Errors from the Compliance Engine
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No rule configured for {from} -> {to} {transaction_type}")]
    RuleNotFound {
        from: Jurisdiction,
        to: Jurisdiction,
        transaction_type: TransactionType,
    },

    #[error("Transaction denied: {0}")]
    TransactionDenied(String),

    #[error("Automated check for {requirement} timed out after {timeout_ms}ms")]
    CheckTimeout { requirement: String, timeout_ms: u64 },

    #[error("Automated check failed: {0}")]
    CheckFailed(String),

    #[error("Framework not found: {0}")]
    FrameworkNotFound(String),

    #[error("Requirement not found: {0}")]
    RequirementNotFound(String),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Alert already resolved: {0}")]
    AlertAlreadyResolved(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to write to compliance ledger: {0}")]
    LedgerWriteError(String),

    #[error("Failed to read compliance ledger: {0}")]
    LedgerReadError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type for compliance operations
pub type ComplianceResult<T> = Result<T, ComplianceError>;

impl ComplianceError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ComplianceError::InvalidInput(msg.into())
    }

    /// A missing rule is a configuration gap, not a policy decision
    pub fn is_config_gap(&self) -> bool {
        matches!(self, ComplianceError::RuleNotFound { .. })
    }

    /// Check if this is a policy denial
    pub fn is_denial(&self) -> bool {
        matches!(self, ComplianceError::TransactionDenied(_))
    }
}
