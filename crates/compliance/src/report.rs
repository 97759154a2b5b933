//! Report Builder - point-in-time snapshot across frameworks and alerts
//!
//! Pure aggregation. Persistence or export is the caller's concern.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use pulse_core::Jurisdiction;
use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::framework::{Framework, FrameworkSnapshot};
use crate::scorer::Scorer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub report_date: DateTime<Utc>,
    /// Jurisdiction filter the report was built with
    pub jurisdiction: Option<Jurisdiction>,
    /// Scorer formula over the pooled active requirements of `frameworks`
    pub overall_score: u8,
    pub frameworks: Vec<FrameworkSnapshot>,
    pub recent_alerts: Vec<Alert>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportBuilder {
    scorer: Scorer,
    recent_alert_limit: usize,
}

impl ReportBuilder {
    pub fn new(scorer: Scorer, recent_alert_limit: usize) -> Self {
        Self {
            scorer,
            recent_alert_limit,
        }
    }

    /// Whether a framework is covered by the jurisdiction filter
    ///
    /// Global frameworks apply to every jurisdiction.
    pub fn includes(framework: &Framework, filter: Option<Jurisdiction>) -> bool {
        match filter {
            None => true,
            Some(j) => framework.jurisdiction == j || framework.jurisdiction == Jurisdiction::Global,
        }
    }

    pub fn build(
        &self,
        frameworks: &[Framework],
        alerts: &[Alert],
        filter: Option<Jurisdiction>,
        now: DateTime<Utc>,
    ) -> ComplianceReport {
        let included: Vec<&Framework> = frameworks
            .iter()
            .filter(|f| Self::includes(f, filter))
            .collect();

        let overall_score = self
            .scorer
            .score(included.iter().flat_map(|f| f.requirements()));

        let snapshots: Vec<FrameworkSnapshot> =
            included.iter().map(|f| self.scorer.snapshot(f)).collect();

        let ids: HashSet<&str> = included.iter().map(|f| f.id.as_str()).collect();
        let mut recent_alerts: Vec<Alert> = alerts
            .iter()
            .filter(|a| ids.contains(a.framework.as_str()))
            .cloned()
            .collect();
        recent_alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent_alerts.truncate(self.recent_alert_limit);

        let recommendations = snapshots
            .iter()
            .filter(|s| self.scorer.needs_attention(s))
            .map(|s| self.recommendation(s))
            .collect();

        ComplianceReport {
            report_date: now,
            jurisdiction: filter,
            overall_score,
            frameworks: snapshots,
            recent_alerts,
            recommendations,
        }
    }

    fn recommendation(&self, snapshot: &FrameworkSnapshot) -> String {
        if snapshot.unmet_critical > 0 {
            let ids: Vec<&str> = snapshot
                .requirements
                .iter()
                .filter(|r| r.is_unmet_critical())
                .map(|r| r.id.as_str())
                .collect();
            format!(
                "{}: resolve {} unmet critical requirement(s) [{}] (score {})",
                snapshot.name,
                snapshot.unmet_critical,
                ids.join(", "),
                snapshot.compliance_score
            )
        } else {
            format!(
                "{}: score {} is below the {} floor; prioritise remediation of not-met requirements",
                snapshot.name,
                snapshot.compliance_score,
                self.scorer.thresholds().non_compliant_floor
            )
        }
    }
}
