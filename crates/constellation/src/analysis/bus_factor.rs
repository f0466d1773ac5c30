//! Bus-factor analysis: CIs that many others structurally depend on.

use super::{bus_factor_multiplier, AnalysisEngine, STRUCTURAL_TYPES};
use crate::domain::{CiId, CiType, Criticality};
use crate::error::Result;
use crate::store::ReadQuery;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// Number of entries a bus-factor report keeps.
pub const BUS_FACTOR_TOP_N: usize = 20;

/// One ranked single point of failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusFactorEntry {
    /// CI id.
    pub id: CiId,
    /// CI name.
    pub name: String,
    /// CI type.
    pub ci_type: CiType,
    /// CI criticality.
    pub criticality: Criticality,
    /// Distinct other CIs with a structural edge into this one.
    pub dependent_count: usize,
    /// `dependent_count × multiplier(criticality)`, two decimals.
    pub risk_score: f64,
}

/// Result of [`AnalysisEngine::bus_factor_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusFactorReport {
    /// Highest-risk CIs, at most [`BUS_FACTOR_TOP_N`].
    pub entries: Vec<BusFactorEntry>,
    /// Number of entries returned.
    pub total_analyzed: usize,
    /// Number of CIs with any structural dependents.
    pub total_candidates: usize,
    /// When the analysis ran.
    pub analyzed_at: DateTime<Utc>,
}

/// Round half away from zero to two decimals.
pub(super) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Bus-factor risk for a fan-in at a criticality.
#[allow(clippy::cast_precision_loss)]
pub(super) fn risk_score(dependent_count: usize, criticality: Criticality) -> f64 {
    round2(dependent_count as f64 * bus_factor_multiplier(criticality))
}

impl AnalysisEngine {
    /// Rank CIs by structural fan-in.
    ///
    /// Fan-in counts distinct other CIs with at least one structural edge
    /// into the CI; self-loops do not count. Ranked by fan-in descending,
    /// criticality descending, then name and id.
    pub async fn bus_factor_analysis(&self) -> Result<BusFactorReport> {
        let rows = self
            .store
            .execute_query(ReadQuery::EdgesOfType {
                types: STRUCTURAL_TYPES.to_vec(),
            })
            .await?;

        let mut dependents: HashMap<CiId, HashSet<CiId>> = HashMap::new();
        for row in rows {
            let source: CiId = row.decode("source_id")?;
            let target: CiId = row.decode("target_id")?;
            if source != target {
                dependents.entry(target).or_default().insert(source);
            }
        }

        let mut candidates: Vec<CiId> = dependents.keys().cloned().collect();
        candidates.sort();
        let summaries = if candidates.is_empty() {
            Vec::new()
        } else {
            self.store
                .execute_query(ReadQuery::CiSummaries { ids: candidates })
                .await?
        };

        let mut entries = Vec::with_capacity(summaries.len());
        for row in summaries {
            let id: CiId = row.decode("id")?;
            let dependent_count = dependents.get(&id).map_or(0, HashSet::len);
            let criticality: Criticality = row.decode("criticality")?;
            entries.push(BusFactorEntry {
                name: row.decode("name")?,
                ci_type: row.decode("ci_type")?,
                criticality,
                dependent_count,
                risk_score: risk_score(dependent_count, criticality),
                id,
            });
        }

        entries.sort_by(|a, b| {
            (Reverse(a.dependent_count), Reverse(a.criticality), &a.name, &a.id).cmp(&(
                Reverse(b.dependent_count),
                Reverse(b.criticality),
                &b.name,
                &b.id,
            ))
        });
        let total_candidates = entries.len();
        entries.truncate(BUS_FACTOR_TOP_N);

        tracing::debug!(
            candidates = total_candidates,
            returned = entries.len(),
            "Bus factor analysis complete"
        );
        Ok(BusFactorReport {
            total_analyzed: entries.len(),
            total_candidates,
            entries,
            analyzed_at: Utc::now(),
        })
    }
}
