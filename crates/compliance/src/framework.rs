//! Frameworks and requirements
//!
//! A framework never stores its own score. The score and status are
//! derived from the requirements by the [`crate::scorer::Scorer`] and only
//! exist on a [`FrameworkSnapshot`].

use chrono::{DateTime, Duration, Utc};
use pulse_core::{Jurisdiction, Severity};
use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, ComplianceResult};

/// Satisfaction state of a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    Met,
    Partial,
    NotMet,
}

impl RequirementStatus {
    /// Credit in half-units: met = 2, partial = 1, not met = 0
    pub fn half_credit(&self) -> u64 {
        match self {
            RequirementStatus::Met => 2,
            RequirementStatus::Partial => 1,
            RequirementStatus::NotMet => 0,
        }
    }
}

impl std::str::FromStr for RequirementStatus {
    type Err = ComplianceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "met" => Ok(RequirementStatus::Met),
            "partial" => Ok(RequirementStatus::Partial),
            "not_met" | "not-met" | "notmet" => Ok(RequirementStatus::NotMet),
            other => Err(ComplianceError::invalid_input(format!(
                "unknown requirement status: {other}"
            ))),
        }
    }
}

/// Category of a framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkKind {
    Privacy,
    Financial,
    Security,
    Labor,
    Tax,
}

/// Derived status of a framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkStatus {
    Compliant,
    AtRisk,
    NonCompliant,
}

/// A single checkable obligation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub status: RequirementStatus,
    pub next_review: DateTime<Utc>,
    #[serde(default)]
    pub automated_check: bool,
    /// Set when a newer requirement replaces this one
    #[serde(default)]
    pub superseded_by: Option<String>,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

impl Requirement {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
        status: RequirementStatus,
        next_review: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            severity,
            status,
            next_review,
            automated_check: false,
            superseded_by: None,
            last_checked: None,
        }
    }

    /// Mark this requirement as checked by an automated predicate
    pub fn automated(mut self) -> Self {
        self.automated_check = true;
        self
    }

    pub fn is_active(&self) -> bool {
        self.superseded_by.is_none()
    }

    /// Critical requirement that is not fully met
    pub fn is_unmet_critical(&self) -> bool {
        self.is_active()
            && self.severity == Severity::Critical
            && self.status != RequirementStatus::Met
    }
}

/// A named regulatory standard composed of requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framework {
    pub id: String,
    pub name: String,
    pub jurisdiction: Jurisdiction,
    pub kind: FrameworkKind,
    #[serde(default)]
    requirements: Vec<Requirement>,
}

impl Framework {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        jurisdiction: Jurisdiction,
        kind: FrameworkKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            jurisdiction,
            kind,
            requirements: Vec::new(),
        }
    }

    /// Builder-style requirement registration (framework definition time)
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// All requirements, including superseded ones
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Requirements that count towards the score
    pub fn active_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter().filter(|r| r.is_active())
    }

    pub fn requirement(&self, id: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.id == id)
    }

    fn requirement_mut(&mut self, id: &str) -> ComplianceResult<&mut Requirement> {
        let framework_id = &self.id;
        self.requirements
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ComplianceError::RequirementNotFound(format!("{framework_id}/{id}")))
    }

    /// Record a check or review outcome. Returns the previous status.
    pub fn set_status(
        &mut self,
        requirement_id: &str,
        status: RequirementStatus,
        checked_at: DateTime<Utc>,
    ) -> ComplianceResult<RequirementStatus> {
        let requirement = self.requirement_mut(requirement_id)?;
        if !requirement.is_active() {
            return Err(ComplianceError::invalid_input(format!(
                "requirement {requirement_id} is superseded"
            )));
        }
        let previous = requirement.status;
        requirement.status = status;
        requirement.last_checked = Some(checked_at);
        Ok(previous)
    }

    /// Replace a requirement with a newer one. The old one is kept.
    pub fn supersede(&mut self, old_id: &str, replacement: Requirement) -> ComplianceResult<()> {
        if self.requirement(&replacement.id).is_some() {
            return Err(ComplianceError::invalid_input(format!(
                "requirement {} already exists in {}",
                replacement.id, self.id
            )));
        }

        let old = self.requirement_mut(old_id)?;
        if let Some(newer) = &old.superseded_by {
            return Err(ComplianceError::invalid_input(format!(
                "requirement {old_id} already superseded by {newer}"
            )));
        }
        old.superseded_by = Some(replacement.id.clone());
        self.requirements.push(replacement);
        Ok(())
    }

    /// Reject catalogs with duplicate requirement ids
    pub fn validate(&self) -> ComplianceResult<()> {
        let mut seen = std::collections::HashSet::new();
        for requirement in &self.requirements {
            if !seen.insert(requirement.id.as_str()) {
                return Err(ComplianceError::ConfigError(format!(
                    "duplicate requirement {} in framework {}",
                    requirement.id, self.id
                )));
            }
        }
        Ok(())
    }
}

/// Point-in-time view of a framework with its derived score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkSnapshot {
    pub id: String,
    pub name: String,
    pub jurisdiction: Jurisdiction,
    pub kind: FrameworkKind,
    pub requirements: Vec<Requirement>,
    pub compliance_score: u8,
    pub status: FrameworkStatus,
    pub unmet_critical: usize,
}

/// Load a framework catalog from a JSON array
pub fn load_frameworks(path: &std::path::Path) -> ComplianceResult<Vec<Framework>> {
    let content = std::fs::read_to_string(path)?;
    let frameworks: Vec<Framework> = serde_json::from_str(&content)?;
    for framework in &frameworks {
        framework.validate()?;
    }
    Ok(frameworks)
}

/// Built-in catalog, with review dates relative to `now`
pub fn builtin_frameworks(now: DateTime<Utc>) -> Vec<Framework> {
    use RequirementStatus::*;
    use Severity::*;

    let days = |n: i64| now + Duration::days(n);

    vec![
        Framework::new("gdpr", "GDPR", Jurisdiction::Eu, FrameworkKind::Privacy)
            .with_requirement(
                Requirement::new("gdpr-art-30", "Records of processing activities", High, Met, days(90))
                    .automated(),
            )
            .with_requirement(Requirement::new(
                "gdpr-art-33",
                "Breach notification within 72 hours",
                Critical,
                Met,
                days(30),
            ))
            .with_requirement(
                Requirement::new("gdpr-art-35", "Data protection impact assessments", Medium, Partial, days(10))
                    .automated(),
            ),
        Framework::new("sox", "Sarbanes-Oxley", Jurisdiction::Us, FrameworkKind::Financial)
            .with_requirement(
                Requirement::new("sox-302", "Quarterly certification of financial reports", Critical, Met, days(45))
                    .automated(),
            )
            .with_requirement(Requirement::new(
                "sox-404",
                "Internal control assessment",
                High,
                Partial,
                days(60),
            )),
        Framework::new("pci-dss", "PCI DSS", Jurisdiction::Global, FrameworkKind::Security)
            .with_requirement(
                Requirement::new("pci-3", "Protect stored cardholder data", Critical, Met, days(120))
                    .automated(),
            )
            .with_requirement(Requirement::new(
                "pci-11",
                "Quarterly vulnerability scans",
                High,
                Met,
                days(20),
            )),
        Framework::new("uk-payroll", "UK PAYE Real Time Information", Jurisdiction::Uk, FrameworkKind::Labor)
            .with_requirement(Requirement::new(
                "paye-fps",
                "Full Payment Submission on or before payday",
                High,
                Met,
                days(25),
            )),
    ]
}
