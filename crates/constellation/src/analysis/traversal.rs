//! Bounded breadth-first traversal over structural edges.

use super::STRUCTURAL_TYPES;
use crate::domain::{CiId, CiType, Criticality, Direction, RelationshipType};
use crate::error::Result;
use crate::store::{GraphStore, ReadQuery};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

/// A CI reached by a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReachedCi {
    /// CI id.
    pub id: CiId,
    /// CI name.
    pub name: String,
    /// CI type.
    pub ci_type: CiType,
    /// CI criticality.
    pub criticality: Criticality,
    /// Hops on the shortest structural path.
    pub distance: u32,
    /// Relationship types along that path, in path order.
    pub relationship_chain: Vec<RelationshipType>,
}

struct Visit {
    distance: u32,
    chain: Vec<RelationshipType>,
}

/// Walk structural edges from `start` up to `max_depth` hops.
///
/// `Incoming` follows edges backwards (who depends on `start`); the chain of
/// each reached CI then reads from that CI towards `start`. `Outgoing`
/// follows edges forwards; the chain reads from `start` outwards.
///
/// `start` itself is never reported. When a CI is reachable along several
/// paths, the first one found at the smallest distance wins.
pub(super) async fn traverse(
    store: &dyn GraphStore,
    start: &CiId,
    direction: Direction,
    max_depth: u32,
) -> Result<Vec<ReachedCi>> {
    let mut visits: HashMap<CiId, Visit> = HashMap::new();
    let mut order: Vec<CiId> = Vec::new();
    let mut frontier = vec![start.clone()];

    for distance in 1..=max_depth {
        if frontier.is_empty() {
            break;
        }
        let rows = store
            .execute_query(ReadQuery::EdgesFrom {
                frontier: std::mem::take(&mut frontier),
                direction,
                types: STRUCTURAL_TYPES.to_vec(),
            })
            .await?;

        for row in rows {
            let from: CiId = row.decode("frontier_id")?;
            let neighbor: CiId = row.decode("neighbor_id")?;
            let rel_type: RelationshipType = row.decode("rel_type")?;

            if &neighbor == start || visits.contains_key(&neighbor) {
                continue;
            }

            let parent_chain = visits
                .get(&from)
                .map(|v| v.chain.as_slice())
                .unwrap_or_default();
            let chain: Vec<RelationshipType> = match direction {
                Direction::Incoming => std::iter::once(rel_type)
                    .chain(parent_chain.iter().copied())
                    .collect(),
                _ => parent_chain
                    .iter()
                    .copied()
                    .chain(std::iter::once(rel_type))
                    .collect(),
            };

            visits.insert(neighbor.clone(), Visit { distance, chain });
            order.push(neighbor.clone());
            frontier.push(neighbor);
        }
    }

    if order.is_empty() {
        return Ok(Vec::new());
    }

    let summaries = store
        .execute_query(ReadQuery::CiSummaries { ids: order })
        .await?;

    let mut reached = Vec::with_capacity(summaries.len());
    for row in summaries {
        let id: CiId = row.decode("id")?;
        let Some(visit) = visits.remove(&id) else {
            continue;
        };
        reached.push(ReachedCi {
            name: row.decode("name")?,
            ci_type: row.decode("ci_type")?,
            criticality: row.decode("criticality")?,
            distance: visit.distance,
            relationship_chain: visit.chain,
            id,
        });
    }

    sort_reached(&mut reached);
    Ok(reached)
}

/// Distance ascending, criticality descending, then name and id.
pub(super) fn sort_reached(reached: &mut [ReachedCi]) {
    reached.sort_by(|a, b| {
        (a.distance, Reverse(a.criticality), &a.name, &a.id).cmp(&(
            b.distance,
            Reverse(b.criticality),
            &b.name,
            &b.id,
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reached(id: &str, distance: u32, criticality: Criticality) -> ReachedCi {
        ReachedCi {
            id: CiId::new(id),
            name: id.to_string(),
            ci_type: CiType::Generic,
            criticality,
            distance,
            relationship_chain: Vec::new(),
        }
    }

    #[test]
    fn sort_orders_by_distance_then_criticality_then_name() {
        let mut items = vec![
            reached("z", 2, Criticality::Critical),
            reached("b", 1, Criticality::Low),
            reached("a", 1, Criticality::Low),
            reached("c", 1, Criticality::High),
        ];
        sort_reached(&mut items);
        let ids: Vec<&str> = items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b", "z"]);
    }
}
