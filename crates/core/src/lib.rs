//! Pulse Core - Domain types
//!
//! This crate contains the fundamental types used across Pulse:
//! - `Amount`: Non-negative decimal wrapper for monetary amounts
//! - `Jurisdiction`: Type-safe jurisdiction codes
//! - `TransactionType`: Kinds of cross-border transactions
//! - `Severity`: Ordered severity levels with scoring weights

pub mod amount;
pub mod jurisdiction;
pub mod severity;
pub mod transaction;

pub use amount::{Amount, AmountError};
pub use jurisdiction::{Jurisdiction, JurisdictionError};
pub use severity::Severity;
pub use transaction::{TransactionType, TransactionTypeError};
