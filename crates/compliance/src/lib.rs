//! Pulse Compliance Engine
//!
//! Cross-border transaction rules, framework scoring, alerting and reports.
//!
//! ## Architecture
//!
//! ```text
//! TransactionRequest ──► Evaluator ──► RuleStore (from, to, type)
//!                                          │
//!                                          ▼
//!                                     Evaluation ─────────────┐
//!                                                             │
//! Ticker ──► Engine::run_tick ──► RequirementCheck (timeout)  │
//!                 │                       │                   │
//!                 ▼                       ▼                   ▼
//!           AlertGenerator ──►  AlertLog (dedup)  ──►  Compliance Ledger (JSONL)
//!                                       │
//!                                       ▼
//!                     Scorer ──► ReportBuilder ──► ComplianceReport
//! ```
//!
//! ## Key Components
//!
//! - [`config::ComplianceConfig`] - Thresholds and intervals (not hardcoded)
//! - [`rules::RuleStore`] - Versioned cross-border rules keyed by jurisdiction pair
//! - [`evaluator::evaluate`] - Pure rule evaluation; config gaps are not denials
//! - [`scorer::Scorer`] - Severity-weighted score and status derivation
//! - [`alert::AlertLog`] - Deduplicated alert log
//! - [`ledger::ComplianceLedger`] - Append-only JSONL ledger
//! - [`engine::ComplianceEngine`] - Main orchestrator
//! - [`scheduler::Ticker`] - Periodic tick driver

pub mod alert;
pub mod check;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod framework;
pub mod generator;
pub mod ledger;
pub mod optimization;
pub mod report;
pub mod rules;
pub mod scheduler;
pub mod scorer;

pub use alert::{Alert, AlertLog, AlertType, RaiseOutcome};
pub use check::{CheckFailure, CheckOutcome, RequirementCheck, StaticCheck, StoredStatusCheck};
pub use config::ComplianceConfig;
pub use engine::{ComplianceEngine, EngineBuilder};
pub use error::{ComplianceError, ComplianceResult};
pub use evaluator::{evaluate, Evaluation, EvaluationOutcome, TransactionRequest};
pub use event::{ComplianceEvent, UpdateSource};
pub use framework::{
    builtin_frameworks, load_frameworks, Framework, FrameworkKind, FrameworkSnapshot,
    FrameworkStatus, Requirement, RequirementStatus,
};
pub use generator::{AlertGenerator, DeadlineState, TickSummary};
pub use ledger::ComplianceLedger;
pub use optimization::{CostProfile, Optimization, OptimizationType, RiskLevel};
pub use report::{ComplianceReport, ReportBuilder};
pub use rules::{Rule, RuleKey, RuleStore};
pub use scheduler::Ticker;
pub use scorer::{ScoreThresholds, Scorer};
