//! Graph state behind the store lock.

use crate::domain::{Ci, CiId, Relationship, RelationshipId};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction as EdgeDirection;
use std::collections::{HashMap, HashSet};

/// CIs, the edge graph and id indexes.
///
/// `StableDiGraph` keeps indices valid across removals, so the id maps never
/// need rebuilding.
#[derive(Debug, Default)]
pub(crate) struct GraphState {
    cis: HashMap<CiId, Ci>,
    graph: StableDiGraph<CiId, Relationship>,
    nodes: HashMap<CiId, NodeIndex>,
    edges: HashMap<RelationshipId, EdgeIndex>,
}

/// Why a relationship could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InsertEdgeError {
    MissingEndpoint,
    DuplicateId,
}

impl GraphState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ci_count(&self) -> usize {
        self.cis.len()
    }

    pub(crate) fn relationship_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn ci(&self, id: &CiId) -> Option<&Ci> {
        self.cis.get(id)
    }

    pub(crate) fn ci_mut(&mut self, id: &CiId) -> Option<&mut Ci> {
        self.cis.get_mut(id)
    }

    pub(crate) fn contains_ci(&self, id: &CiId) -> bool {
        self.cis.contains_key(id)
    }

    pub(crate) fn cis(&self) -> impl Iterator<Item = &Ci> {
        self.cis.values()
    }

    pub(crate) fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.graph.edge_weights()
    }

    /// Insert a CI. Returns `false` without change if the id is taken.
    pub(crate) fn insert_ci(&mut self, ci: Ci) -> bool {
        if self.cis.contains_key(&ci.id) {
            return false;
        }
        let node = self.graph.add_node(ci.id.clone());
        self.nodes.insert(ci.id.clone(), node);
        self.cis.insert(ci.id.clone(), ci);
        true
    }

    /// Remove a CI and its incident edges.
    ///
    /// Returns the number of edges removed, or `None` if the CI was absent.
    pub(crate) fn remove_ci(&mut self, id: &CiId) -> Option<usize> {
        let node = self.nodes.remove(id)?;
        self.cis.remove(id);

        let incident: HashSet<RelationshipId> = self
            .graph
            .edges_directed(node, EdgeDirection::Outgoing)
            .chain(self.graph.edges_directed(node, EdgeDirection::Incoming))
            .map(|edge| edge.weight().id.clone())
            .collect();
        for rel_id in &incident {
            self.edges.remove(rel_id);
        }

        self.graph.remove_node(node);
        Some(incident.len())
    }

    /// Insert an edge between two existing CIs.
    pub(crate) fn insert_relationship(
        &mut self,
        relationship: Relationship,
    ) -> Result<(), InsertEdgeError> {
        if self.edges.contains_key(&relationship.id) {
            return Err(InsertEdgeError::DuplicateId);
        }
        let (Some(&source), Some(&target)) = (
            self.nodes.get(&relationship.source_id),
            self.nodes.get(&relationship.target_id),
        ) else {
            return Err(InsertEdgeError::MissingEndpoint);
        };

        let rel_id = relationship.id.clone();
        let edge = self.graph.add_edge(source, target, relationship);
        self.edges.insert(rel_id, edge);
        Ok(())
    }

    pub(crate) fn remove_relationship(&mut self, id: &RelationshipId) -> Option<Relationship> {
        let edge = self.edges.remove(id)?;
        self.graph.remove_edge(edge)
    }

    /// Edges leaving (`Outgoing`) or entering (`Incoming`) a CI.
    ///
    /// Each item is the relationship and the CI at the other end.
    pub(crate) fn incident(
        &self,
        id: &CiId,
        direction: EdgeDirection,
    ) -> Vec<(&Relationship, &CiId)> {
        let Some(&node) = self.nodes.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(node, direction)
            .filter_map(|edge| {
                let other = match direction {
                    EdgeDirection::Outgoing => edge.target(),
                    EdgeDirection::Incoming => edge.source(),
                };
                self.graph
                    .node_weight(other)
                    .map(|other_id| (edge.weight(), other_id))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewCi, RelationshipProperties, RelationshipType};
    use chrono::Utc;

    fn ci(id: &str) -> Ci {
        let mut new = NewCi::new(id);
        new.id = Some(CiId::new(id));
        new.into_ci(Utc::now())
    }

    fn rel(from: &str, to: &str) -> Relationship {
        Relationship::new(
            CiId::new(from),
            CiId::new(to),
            RelationshipType::DependsOn,
            RelationshipProperties::default(),
            Utc::now(),
        )
    }

    #[test]
    fn duplicate_ci_is_refused() {
        let mut state = GraphState::new();
        assert!(state.insert_ci(ci("a")));
        assert!(!state.insert_ci(ci("a")));
        assert_eq!(state.ci_count(), 1);
    }

    #[test]
    fn edge_requires_both_endpoints() {
        let mut state = GraphState::new();
        state.insert_ci(ci("a"));
        assert_eq!(
            state.insert_relationship(rel("a", "ghost")),
            Err(InsertEdgeError::MissingEndpoint)
        );
        assert_eq!(state.relationship_count(), 0);
    }

    #[test]
    fn removing_ci_drops_incident_edges_including_self_loops() {
        let mut state = GraphState::new();
        for id in ["a", "b", "c"] {
            state.insert_ci(ci(id));
        }
        state.insert_relationship(rel("a", "b")).unwrap();
        state.insert_relationship(rel("c", "b")).unwrap();
        state.insert_relationship(rel("b", "b")).unwrap();
        state.insert_relationship(rel("a", "c")).unwrap();

        assert_eq!(state.remove_ci(&CiId::new("b")), Some(3));
        assert_eq!(state.relationship_count(), 1);
        assert_eq!(state.remove_ci(&CiId::new("b")), None);

        // Indices of surviving nodes stay valid.
        let outgoing = state.incident(&CiId::new("a"), EdgeDirection::Outgoing);
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].1, &CiId::new("c"));
    }

    #[test]
    fn remove_relationship_by_id() {
        let mut state = GraphState::new();
        state.insert_ci(ci("a"));
        state.insert_ci(ci("b"));
        let r = rel("a", "b");
        let id = r.id.clone();
        state.insert_relationship(r).unwrap();

        assert!(state.remove_relationship(&id).is_some());
        assert!(state.remove_relationship(&id).is_none());
    }
}
