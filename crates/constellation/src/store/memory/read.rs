//! Read statement execution.

use super::state::GraphState;
use crate::domain::{Ci, CiId, Direction, Relationship, RelationshipType};
use crate::error::Result;
use crate::store::{ReadQuery, Record};
use petgraph::Direction as EdgeDirection;
use std::collections::HashMap;

pub(super) fn execute(state: &GraphState, query: ReadQuery) -> Result<Vec<Record>> {
    match query {
        ReadQuery::Ping => Ok(vec![Record::new().with("ok", 1)]),

        ReadQuery::CiById { id } => state
            .ci(&id)
            .map(ci_row)
            .transpose()
            .map(|row| row.into_iter().collect()),

        ReadQuery::Cis {
            filter,
            limit,
            offset,
        } => {
            let mut cis: Vec<&Ci> = state.cis().filter(|ci| filter.matches(ci)).collect();
            sort_by_name(&mut cis);
            cis.into_iter().skip(offset).take(limit).map(ci_row).collect()
        }

        ReadQuery::CountCis { filter } => {
            let total = state.cis().filter(|ci| filter.matches(ci)).count();
            Ok(vec![Record::new().with("total", total)])
        }

        ReadQuery::SearchCis { text, limit } => {
            let needle = text.to_lowercase();
            let mut cis: Vec<&Ci> = state.cis().filter(|ci| matches_text(ci, &needle)).collect();
            sort_by_name(&mut cis);
            cis.into_iter().take(limit).map(ci_row).collect()
        }

        ReadQuery::CiRelationships { ci_id, direction } => ci_relationships(state, &ci_id, direction),

        ReadQuery::Relationships { limit, offset } => {
            let mut rels: Vec<&Relationship> = state.relationships().collect();
            rels.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            rels.into_iter()
                .skip(offset)
                .take(limit)
                .map(|rel| -> Result<Record> {
                    Ok(Record::new()
                        .with("id", rel.id.as_str())
                        .with_serialized("relationship_type", &rel.relationship_type)?
                        .with_serialized("created_at", &rel.created_at)?
                        .with("source_id", rel.source_id.as_str())
                        .with("source_name", name_of(state, &rel.source_id))
                        .with("target_id", rel.target_id.as_str())
                        .with("target_name", name_of(state, &rel.target_id)))
                })
                .collect()
        }

        ReadQuery::GraphCounts => {
            let distinct_types = type_histogram(state).len();
            Ok(vec![Record::new()
                .with("total_cis", state.ci_count())
                .with("total_relationships", state.relationship_count())
                .with("relationship_type_count", distinct_types)])
        }

        ReadQuery::RelationshipTypeCounts => {
            let mut counts: Vec<(RelationshipType, usize)> =
                type_histogram(state).into_iter().collect();
            counts.sort_by(|(ta, ca), (tb, cb)| cb.cmp(ca).then_with(|| ta.as_str().cmp(tb.as_str())));
            counts
                .into_iter()
                .map(|(rel_type, count)| -> Result<Record> {
                    Ok(Record::new()
                        .with_serialized("relationship_type", &rel_type)?
                        .with("count", count))
                })
                .collect()
        }

        ReadQuery::EdgesFrom {
            frontier,
            direction,
            types,
        } => edges_from(state, &frontier, direction, &types),

        ReadQuery::EdgesOfType { types } => {
            let mut edges: Vec<(&CiId, &CiId)> = state
                .relationships()
                .filter(|rel| type_allowed(&types, rel.relationship_type))
                .map(|rel| (&rel.source_id, &rel.target_id))
                .collect();
            edges.sort();
            Ok(edges
                .into_iter()
                .map(|(source, target)| {
                    Record::new()
                        .with("source_id", source.as_str())
                        .with("target_id", target.as_str())
                })
                .collect())
        }

        ReadQuery::CiSummaries { ids } => ids
            .iter()
            .filter_map(|id| state.ci(id))
            .map(|ci| -> Result<Record> {
                Ok(Record::new()
                    .with("id", ci.id.as_str())
                    .with("name", ci.name.as_str())
                    .with_serialized("criticality", &ci.criticality)?
                    .with_serialized("ci_type", &ci.ci_type)?)
            })
            .collect(),
    }
}

fn ci_row(ci: &Ci) -> Result<Record> {
    Record::new().with_serialized("ci", ci)
}

fn sort_by_name(cis: &mut [&Ci]) {
    cis.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

fn matches_text(ci: &Ci, needle: &str) -> bool {
    [Some(ci.name.as_str()), ci.description.as_deref(), ci.hostname.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

fn name_of<'a>(state: &'a GraphState, id: &CiId) -> &'a str {
    state.ci(id).map_or("", |ci| ci.name.as_str())
}

fn type_histogram(state: &GraphState) -> HashMap<RelationshipType, usize> {
    let mut counts = HashMap::new();
    for rel in state.relationships() {
        *counts.entry(rel.relationship_type).or_insert(0) += 1;
    }
    counts
}

fn type_allowed(types: &[RelationshipType], rel_type: RelationshipType) -> bool {
    types.is_empty() || types.contains(&rel_type)
}

/// Outgoing and incoming edges in the order callers should see them.
fn directed_sides(direction: Direction) -> Vec<(EdgeDirection, Direction)> {
    let mut sides = Vec::with_capacity(2);
    if direction.includes_outgoing() {
        sides.push((EdgeDirection::Outgoing, Direction::Outgoing));
    }
    if direction.includes_incoming() {
        sides.push((EdgeDirection::Incoming, Direction::Incoming));
    }
    sides
}

fn ci_relationships(state: &GraphState, ci_id: &CiId, direction: Direction) -> Result<Vec<Record>> {
    let mut rows = Vec::new();
    for (edge_direction, label) in directed_sides(direction) {
        let mut incident = state.incident(ci_id, edge_direction);
        incident.sort_by(|(a, _), (b, _)| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        for (rel, other) in incident {
            rows.push(
                Record::new()
                    .with("rel_id", rel.id.as_str())
                    .with_serialized("rel_type", &rel.relationship_type)?
                    .with_serialized("rel_created_at", &rel.created_at)?
                    .with("related_id", other.as_str())
                    .with("related_name", name_of(state, other))
                    .with_serialized("direction", &label)?,
            );
        }
    }
    Ok(rows)
}

fn edges_from(
    state: &GraphState,
    frontier: &[CiId],
    direction: Direction,
    types: &[RelationshipType],
) -> Result<Vec<Record>> {
    let mut rows = Vec::new();
    for ci_id in frontier {
        let mut hop: Vec<(&CiId, RelationshipType)> = directed_sides(direction)
            .into_iter()
            .flat_map(|(edge_direction, _)| state.incident(ci_id, edge_direction))
            .filter(|(rel, _)| type_allowed(types, rel.relationship_type))
            .map(|(rel, other)| (other, rel.relationship_type))
            .collect();
        hop.sort_by(|(ia, ta), (ib, tb)| ia.cmp(ib).then_with(|| ta.as_str().cmp(tb.as_str())));

        for (neighbor, rel_type) in hop {
            rows.push(
                Record::new()
                    .with("frontier_id", ci_id.as_str())
                    .with("neighbor_id", neighbor.as_str())
                    .with_serialized("rel_type", &rel_type)?,
            );
        }
    }
    Ok(rows)
}
