//! Scorer - derives a 0-100 compliance score from requirement states
//!
//! ```text
//! score = round(100 * Σ weight(severity) * credit(status) / Σ weight(severity))
//!
//! weight:  critical 4, high 3, medium 2, low 1
//! credit:  met 1, partial 1/2, not_met 0
//! ```
//!
//! Superseded requirements are excluded. An empty set scores 100.
//! Status precedence: any unmet critical requirement => `at_risk`;
//! otherwise `compliant` at or above the compliant threshold, `non_compliant`
//! below the floor, and `at_risk` in between.

use crate::config::ComplianceConfig;
use crate::framework::{Framework, FrameworkSnapshot, FrameworkStatus, Requirement};

/// Thresholds used to derive a framework status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreThresholds {
    pub compliant: u8,
    pub non_compliant_floor: u8,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self::from(&ComplianceConfig::default())
    }
}

impl From<&ComplianceConfig> for ScoreThresholds {
    fn from(config: &ComplianceConfig) -> Self {
        Self {
            compliant: config.compliant_threshold,
            non_compliant_floor: config.non_compliant_floor,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    thresholds: ScoreThresholds,
}

impl Scorer {
    pub fn new(thresholds: ScoreThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> ScoreThresholds {
        self.thresholds
    }

    /// Weighted score of the active requirements, rounded half up
    pub fn score<'a>(&self, requirements: impl IntoIterator<Item = &'a Requirement>) -> u8 {
        let (earned, total) = requirements
            .into_iter()
            .filter(|r| r.is_active())
            .fold((0u64, 0u64), |(earned, total), r| {
                let weight = u64::from(r.severity.weight());
                (earned + weight * r.status.half_credit(), total + weight * 2)
            });

        if total == 0 {
            return 100;
        }

        // round(100 * earned / total) in integer arithmetic
        ((200 * earned + total) / (2 * total)) as u8
    }

    /// Derive the status from a score and the unmet-critical count
    pub fn status(&self, score: u8, unmet_critical: usize) -> FrameworkStatus {
        if unmet_critical > 0 {
            FrameworkStatus::AtRisk
        } else if score >= self.thresholds.compliant {
            FrameworkStatus::Compliant
        } else if score < self.thresholds.non_compliant_floor {
            FrameworkStatus::NonCompliant
        } else {
            FrameworkStatus::AtRisk
        }
    }

    /// Build a snapshot of `framework` with its derived score and status
    pub fn snapshot(&self, framework: &Framework) -> FrameworkSnapshot {
        let compliance_score = self.score(framework.requirements());
        let unmet_critical = framework
            .active_requirements()
            .filter(|r| r.is_unmet_critical())
            .count();

        FrameworkSnapshot {
            id: framework.id.clone(),
            name: framework.name.clone(),
            jurisdiction: framework.jurisdiction,
            kind: framework.kind,
            requirements: framework.requirements().to_vec(),
            compliance_score,
            status: self.status(compliance_score, unmet_critical),
            unmet_critical,
        }
    }

    /// Whether a snapshot warrants a recommendation in a report
    pub fn needs_attention(&self, snapshot: &FrameworkSnapshot) -> bool {
        snapshot.compliance_score < self.thresholds.non_compliant_floor || snapshot.unmet_critical > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{FrameworkKind, RequirementStatus};
    use chrono::Utc;
    use pulse_core::{Jurisdiction, Severity};

    const SEVERITIES: [Severity; 4] = [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];
    const STATUSES: [RequirementStatus; 3] =
        [RequirementStatus::NotMet, RequirementStatus::Partial, RequirementStatus::Met];

    fn req(id: &str, severity: Severity, status: RequirementStatus) -> Requirement {
        Requirement::new(id, id, severity, status, Utc::now())
    }

    #[test]
    fn test_empty_scores_100() {
        assert_eq!(Scorer::default().score(&Vec::<Requirement>::new()), 100);
    }

    #[test]
    fn test_all_met_and_all_not_met() {
        let scorer = Scorer::default();
        let met: Vec<_> = SEVERITIES
            .iter()
            .enumerate()
            .map(|(i, s)| req(&i.to_string(), *s, RequirementStatus::Met))
            .collect();
        assert_eq!(scorer.score(&met), 100);

        let not_met: Vec<_> = SEVERITIES
            .iter()
            .enumerate()
            .map(|(i, s)| req(&i.to_string(), *s, RequirementStatus::NotMet))
            .collect();
        assert_eq!(scorer.score(&not_met), 0);
    }

    #[test]
    fn test_weighted_score() {
        let scorer = Scorer::default();
        // critical met (4/4) + low not met (0/1) => 80
        let reqs = vec![
            req("a", Severity::Critical, RequirementStatus::Met),
            req("b", Severity::Low, RequirementStatus::NotMet),
        ];
        assert_eq!(scorer.score(&reqs), 80);

        // high partial (1.5/3) + medium met (2/2) => 3.5 / 5 = 70
        let reqs = vec![
            req("a", Severity::High, RequirementStatus::Partial),
            req("b", Severity::Medium, RequirementStatus::Met),
        ];
        assert_eq!(scorer.score(&reqs), 70);
    }

    #[test]
    fn test_rounding_half_up() {
        let scorer = Scorer::default();
        // high met (3) + high met (3) + low not met (0) + low partial (0.5) => 6.5/8 = 81.25 -> 81
        let reqs = vec![
            req("a", Severity::High, RequirementStatus::Met),
            req("b", Severity::High, RequirementStatus::Met),
            req("c", Severity::Low, RequirementStatus::NotMet),
            req("d", Severity::Low, RequirementStatus::Partial),
        ];
        assert_eq!(scorer.score(&reqs), 81);

        // low partial + low partial + low met => 2/3 = 66.67 -> 67
        let reqs = vec![
            req("a", Severity::Low, RequirementStatus::Partial),
            req("b", Severity::Low, RequirementStatus::Partial),
            req("c", Severity::Low, RequirementStatus::Met),
        ];
        assert_eq!(scorer.score(&reqs), 67);
    }

    #[test]
    fn test_superseded_requirements_ignored() {
        let scorer = Scorer::default();
        let mut old = req("a", Severity::Critical, RequirementStatus::NotMet);
        old.superseded_by = Some("a2".to_string());
        let reqs = vec![old, req("a2", Severity::Critical, RequirementStatus::Met)];
        assert_eq!(scorer.score(&reqs), 100);
    }

    #[test]
    fn test_score_is_monotonic_in_status() {
        let scorer = Scorer::default();
        let background = vec![
            req("x", Severity::High, RequirementStatus::Partial),
            req("y", Severity::Low, RequirementStatus::NotMet),
            req("z", Severity::Critical, RequirementStatus::Met),
        ];

        for severity in SEVERITIES {
            let mut last = None;
            for status in STATUSES {
                let mut reqs = background.clone();
                reqs.push(req("subject", severity, status));
                let score = scorer.score(&reqs);
                if let Some(prev) = last {
                    assert!(score >= prev, "{severity:?} {status:?}: {score} < {prev}");
                }
                last = Some(score);
            }
        }
    }

    #[test]
    fn test_status_precedence() {
        let scorer = Scorer::default();
        assert_eq!(scorer.status(100, 0), FrameworkStatus::Compliant);
        assert_eq!(scorer.status(90, 0), FrameworkStatus::Compliant);
        assert_eq!(scorer.status(89, 0), FrameworkStatus::AtRisk);
        assert_eq!(scorer.status(70, 0), FrameworkStatus::AtRisk);
        assert_eq!(scorer.status(69, 0), FrameworkStatus::NonCompliant);
        // Unmet critical always means at risk
        assert_eq!(scorer.status(95, 1), FrameworkStatus::AtRisk);
        assert_eq!(scorer.status(10, 2), FrameworkStatus::AtRisk);
    }

    #[test]
    fn test_custom_thresholds() {
        let scorer = Scorer::new(ScoreThresholds {
            compliant: 95,
            non_compliant_floor: 50,
        });
        assert_eq!(scorer.status(94, 0), FrameworkStatus::AtRisk);
        assert_eq!(scorer.status(49, 0), FrameworkStatus::NonCompliant);
    }

    #[test]
    fn test_snapshot_matches_score() {
        let scorer = Scorer::default();
        let fw = Framework::new("sox", "SOX", Jurisdiction::Us, FrameworkKind::Financial)
            .with_requirement(req("a", Severity::Critical, RequirementStatus::Partial))
            .with_requirement(req("b", Severity::Low, RequirementStatus::Met));

        let snap = scorer.snapshot(&fw);
        assert_eq!(snap.compliance_score, scorer.score(fw.requirements()));
        assert_eq!(snap.compliance_score, 60); // (2 + 1) / 5
        assert_eq!(snap.unmet_critical, 1);
        assert_eq!(snap.status, FrameworkStatus::AtRisk);
        assert!(scorer.needs_attention(&snap));
    }
}
