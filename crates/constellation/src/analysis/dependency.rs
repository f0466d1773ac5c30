//! Dependency analysis: what a CI depends on.

use super::traversal::{traverse, ReachedCi};
use super::AnalysisEngine;
use crate::domain::{CiId, Direction};
use crate::error::Result;
use serde::Serialize;

/// Result of [`AnalysisEngine::dependency_analysis`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    /// The CI whose dependencies are listed.
    pub source_id: CiId,
    /// Number of dependencies found.
    pub total_dependencies: usize,
    /// Dependencies, nearest and most critical first.
    pub dependencies: Vec<ReachedCi>,
    /// Depth actually used.
    pub max_depth: u32,
}

impl AnalysisEngine {
    /// Follow structural edges forward from `ci_id` for at most `max_depth`
    /// hops.
    ///
    /// Same clamping and ordering as [`impact_analysis`](Self::impact_analysis);
    /// chains read from `ci_id` outwards.
    pub async fn dependency_analysis(
        &self,
        ci_id: &CiId,
        max_depth: Option<u32>,
    ) -> Result<DependencyReport> {
        let depth = self.effective_depth(max_depth);
        let dependencies = traverse(self.store.as_ref(), ci_id, Direction::Outgoing, depth).await?;
        tracing::debug!(ci_id = %ci_id, depth, found = dependencies.len(), "Dependency analysis complete");
        Ok(DependencyReport {
            source_id: ci_id.clone(),
            total_dependencies: dependencies.len(),
            dependencies,
            max_depth: depth,
        })
    }
}
