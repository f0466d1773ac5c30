//! Graph analyses: impact, dependency and bus factor.
//!
//! All three walk only *structural* edges ([`STRUCTURAL_TYPES`]): an edge of
//! another type never propagates failure. Impact and dependency analysis are
//! bounded breadth-first traversals driven from the core, one
//! [`ReadQuery::EdgesFrom`](crate::store::ReadQuery::EdgesFrom) per level;
//! bus-factor analysis counts structural fan-in across the whole graph.

mod bus_factor;
mod dependency;
mod impact;
mod traversal;

pub use bus_factor::{BusFactorEntry, BusFactorReport, BUS_FACTOR_TOP_N};
pub use dependency::DependencyReport;
pub use impact::{CriticalityBreakdown, ImpactReport};
pub use traversal::ReachedCi;

use crate::domain::{Criticality, RelationshipType};
use crate::store::GraphStore;
use std::sync::Arc;

/// Edge types that carry failure from one CI to another.
pub const STRUCTURAL_TYPES: [RelationshipType; 3] = [
    RelationshipType::DependsOn,
    RelationshipType::HostedOn,
    RelationshipType::Uses,
];

/// Depth used when the caller gives none.
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Smallest accepted traversal depth.
pub const MIN_DEPTH: u32 = 1;

/// Largest accepted traversal depth.
pub const MAX_DEPTH: u32 = 5;

/// Clamp a requested depth into [`MIN_DEPTH`, `MAX_DEPTH`].
#[must_use]
pub fn clamp_depth(depth: u32) -> u32 {
    depth.clamp(MIN_DEPTH, MAX_DEPTH)
}

/// Points each impacted CI adds to an impact risk score.
#[must_use]
pub const fn impact_weight(criticality: Criticality) -> u32 {
    match criticality {
        Criticality::Critical => 10,
        Criticality::High => 5,
        Criticality::Medium => 2,
        Criticality::Low => 1,
    }
}

/// Multiplier applied to fan-in for bus-factor risk.
#[must_use]
pub const fn bus_factor_multiplier(criticality: Criticality) -> f64 {
    match criticality {
        Criticality::Critical => 3.0,
        Criticality::High => 2.0,
        Criticality::Medium => 1.5,
        Criticality::Low => 1.0,
    }
}

/// Runs the three analyses against a shared store.
#[derive(Clone)]
pub struct AnalysisEngine {
    store: Arc<dyn GraphStore>,
    default_depth: u32,
}

impl std::fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("default_depth", &self.default_depth)
            .field("store", &"<dyn GraphStore>")
            .finish()
    }
}

impl AnalysisEngine {
    /// Engine using [`DEFAULT_MAX_DEPTH`] when no depth is requested.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            default_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the default depth (clamped).
    #[must_use]
    pub fn with_default_depth(mut self, depth: u32) -> Self {
        self.default_depth = clamp_depth(depth);
        self
    }

    /// The effective depth for an optional request.
    #[must_use]
    pub fn effective_depth(&self, requested: Option<u32>) -> u32 {
        clamp_depth(requested.unwrap_or(self.default_depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0, 1)]
    #[case::one(1, 1)]
    #[case::three(3, 3)]
    #[case::five(5, 5)]
    #[case::huge(99, 5)]
    fn depth_is_clamped(#[case] requested: u32, #[case] expected: u32) {
        assert_eq!(clamp_depth(requested), expected);
    }

    #[test]
    fn impact_weights_follow_criticality_order() {
        let weights: Vec<u32> = Criticality::ALL.iter().map(|c| impact_weight(*c)).collect();
        assert_eq!(weights, vec![1, 2, 5, 10]);
    }

    #[test]
    fn structural_types_are_not_bidirectional() {
        assert!(STRUCTURAL_TYPES.iter().all(|t| !t.is_bidirectional()));
    }
}
