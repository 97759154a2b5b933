//! Transaction types that cross-border rules are keyed on

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing transaction types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionTypeError {
    #[error("Unknown transaction type: {0}")]
    Unknown(String),
}

/// Kind of cross-border transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Payment,
    Invoice,
    Payroll,
    Transfer,
    Contract,
    Refund,
}

impl TransactionType {
    /// All transaction types
    pub const ALL: [TransactionType; 6] = [
        TransactionType::Payment,
        TransactionType::Invoice,
        TransactionType::Payroll,
        TransactionType::Transfer,
        TransactionType::Contract,
        TransactionType::Refund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Payment => "payment",
            TransactionType::Invoice => "invoice",
            TransactionType::Payroll => "payroll",
            TransactionType::Transfer => "transfer",
            TransactionType::Contract => "contract",
            TransactionType::Refund => "refund",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = TransactionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        TransactionType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or(TransactionTypeError::Unknown(s))
    }
}
