//! Cost optimization analysis
//!
//! Derived output only: optimizations are recomputed on every pass from
//! the supplied cost profiles and never stored.

use pulse_core::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, ComplianceResult};

/// Cost category an optimization applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationType {
    Vendor,
    Payroll,
    Tax,
    Infrastructure,
    Subscription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Observed spend for a category against a benchmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostProfile {
    pub category: OptimizationType,
    pub current_cost: Amount,
    /// Achievable cost for comparable organisations
    pub benchmark_cost: Amount,
    /// Spend volatility in `[0, 1]`; higher means the benchmark is less reliable
    #[serde(default)]
    pub volatility: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Optimization {
    #[serde(rename = "type")]
    pub optimization_type: OptimizationType,
    pub current_cost: Amount,
    pub optimized_cost: Amount,
    pub savings: Amount,
    /// Confidence in `[0, 1]`
    pub confidence: Decimal,
    pub risk_level: RiskLevel,
}

impl CostProfile {
    fn validate(&self) -> ComplianceResult<()> {
        if self.volatility < Decimal::ZERO || self.volatility > Decimal::ONE {
            return Err(ComplianceError::invalid_input(format!(
                "{:?}: volatility {} outside [0, 1]",
                self.category, self.volatility
            )));
        }
        Ok(())
    }

    /// Optimization for this profile, or `None` if already at or below benchmark
    pub fn optimize(&self) -> ComplianceResult<Option<Optimization>> {
        self.validate()?;

        let Some(savings) = self.current_cost.checked_sub(&self.benchmark_cost) else {
            return Ok(None);
        };
        if savings.is_zero() {
            return Ok(None);
        }

        let confidence = (Decimal::ONE - self.volatility).round_dp(2);
        let risk_level = risk_level(self.category, savings.value(), self.current_cost.value());

        Ok(Some(Optimization {
            optimization_type: self.category,
            current_cost: self.current_cost,
            optimized_cost: self.benchmark_cost,
            savings,
            confidence,
            risk_level,
        }))
    }
}

/// Cutting more than a third of a line is high risk; tax restructuring is
/// never below medium.
fn risk_level(category: OptimizationType, savings: Decimal, current: Decimal) -> RiskLevel {
    let ratio = savings / current;
    let by_ratio = if ratio > Decimal::new(33, 2) {
        RiskLevel::High
    } else if ratio > Decimal::new(15, 2) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    match category {
        OptimizationType::Tax => by_ratio.max(RiskLevel::Medium),
        _ => by_ratio,
    }
}

/// Analyze all profiles; returns optimizations sorted by savings, largest first
pub fn analyze(profiles: &[CostProfile]) -> ComplianceResult<Vec<Optimization>> {
    let mut optimizations = Vec::new();
    for profile in profiles {
        if let Some(opt) = profile.optimize()? {
            optimizations.push(opt);
        }
    }
    optimizations.sort_by(|a, b| b.savings.cmp(&a.savings));
    Ok(optimizations)
}

/// Sum of savings across optimizations
pub fn total_savings(optimizations: &[Optimization]) -> Decimal {
    optimizations.iter().map(|o| o.savings.value()).sum()
}
