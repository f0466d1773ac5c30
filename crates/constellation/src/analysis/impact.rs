//! Impact analysis: what breaks if a CI fails.

use super::traversal::{traverse, ReachedCi};
use super::{impact_weight, AnalysisEngine};
use crate::domain::{CiId, Criticality, Direction};
use crate::error::Result;
use serde::Serialize;

/// Impacted CIs per criticality level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct CriticalityBreakdown {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl CriticalityBreakdown {
    fn record(&mut self, criticality: Criticality) {
        match criticality {
            Criticality::Critical => self.critical += 1,
            Criticality::High => self.high += 1,
            Criticality::Medium => self.medium += 1,
            Criticality::Low => self.low += 1,
        }
    }

    /// Count for one level.
    #[must_use]
    pub fn get(&self, criticality: Criticality) -> usize {
        match criticality {
            Criticality::Critical => self.critical,
            Criticality::High => self.high,
            Criticality::Medium => self.medium,
            Criticality::Low => self.low,
        }
    }
}

/// Result of [`AnalysisEngine::impact_analysis`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactReport {
    /// The CI whose failure is analyzed.
    pub source_id: CiId,
    /// Number of impacted CIs.
    pub total_impacted: usize,
    /// Impacted CIs, nearest and most critical first.
    pub impacted: Vec<ReachedCi>,
    /// Impacted CIs per criticality.
    pub criticality_breakdown: CriticalityBreakdown,
    /// `10·CRITICAL + 5·HIGH + 2·MEDIUM + 1·LOW`.
    pub risk_score: u32,
    /// Depth actually used.
    pub max_depth: u32,
}

impl ImpactReport {
    fn from_reached(source_id: CiId, impacted: Vec<ReachedCi>, max_depth: u32) -> Self {
        let mut criticality_breakdown = CriticalityBreakdown::default();
        for ci in &impacted {
            criticality_breakdown.record(ci.criticality);
        }
        let risk_score = impacted.iter().map(|ci| impact_weight(ci.criticality)).sum();
        Self {
            source_id,
            total_impacted: impacted.len(),
            impacted,
            criticality_breakdown,
            risk_score,
            max_depth,
        }
    }
}

impl AnalysisEngine {
    /// Find every CI with a structural path of at most `max_depth` hops
    /// leading to `ci_id`.
    ///
    /// `max_depth` is clamped to [1, 5]; `None` uses the engine default. An
    /// unknown `ci_id` yields an empty report.
    pub async fn impact_analysis(&self, ci_id: &CiId, max_depth: Option<u32>) -> Result<ImpactReport> {
        let depth = self.effective_depth(max_depth);
        let impacted = traverse(self.store.as_ref(), ci_id, Direction::Incoming, depth).await?;
        let report = ImpactReport::from_reached(ci_id.clone(), impacted, depth);
        tracing::debug!(
            ci_id = %ci_id,
            depth,
            impacted = report.total_impacted,
            risk_score = report.risk_score,
            "Impact analysis complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CiType;

    fn reached(criticality: Criticality) -> ReachedCi {
        ReachedCi {
            id: CiId::generate(),
            name: "x".to_string(),
            ci_type: CiType::Service,
            criticality,
            distance: 1,
            relationship_chain: Vec::new(),
        }
    }

    #[test]
    fn risk_score_weights_each_level() {
        let report = ImpactReport::from_reached(
            CiId::new("src"),
            vec![
                reached(Criticality::Critical),
                reached(Criticality::High),
                reached(Criticality::Medium),
                reached(Criticality::Low),
                reached(Criticality::Low),
            ],
            3,
        );
        assert_eq!(report.risk_score, 10 + 5 + 2 + 1 + 1);
        assert_eq!(report.criticality_breakdown.low, 2);
        assert_eq!(report.criticality_breakdown.get(Criticality::Critical), 1);
        assert_eq!(report.total_impacted, 5);
    }

    #[test]
    fn empty_report_has_zero_risk() {
        let report = ImpactReport::from_reached(CiId::new("src"), Vec::new(), 1);
        assert_eq!(report.risk_score, 0);
        assert_eq!(report.criticality_breakdown, CriticalityBreakdown::default());
    }
}
