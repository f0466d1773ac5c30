//! Write statement execution.

use super::state::{GraphState, InsertEdgeError};
use crate::error::{Error, Result};
use crate::store::{Record, WriteQuery};

/// Rows returned by a write and whether the graph changed.
pub(super) struct WriteOutcome {
    pub(super) rows: Vec<Record>,
    pub(super) changed: bool,
}

impl WriteOutcome {
    fn changed(rows: Vec<Record>) -> Self {
        Self {
            rows,
            changed: true,
        }
    }

    fn unchanged(rows: Vec<Record>) -> Self {
        Self {
            rows,
            changed: false,
        }
    }
}

/// Apply one write. Constraint checks run before anything is mutated, so an
/// error leaves `state` untouched.
pub(super) fn execute(state: &mut GraphState, query: WriteQuery) -> Result<WriteOutcome> {
    match query {
        WriteQuery::CreateCi { ci } => {
            if state.contains_ci(&ci.id) {
                return Err(Error::ConstraintViolation(format!(
                    "a CI with id '{}' already exists",
                    ci.id
                )));
            }
            let row = Record::new().with_serialized("ci", &ci)?;
            state.insert_ci(ci);
            Ok(WriteOutcome::changed(vec![row]))
        }

        WriteQuery::UpdateCi {
            id,
            update,
            updated_at,
        } => match state.ci_mut(&id) {
            Some(ci) => {
                update.apply(ci, updated_at);
                let row = Record::new().with_serialized("ci", &*ci)?;
                Ok(WriteOutcome::changed(vec![row]))
            }
            None => Ok(WriteOutcome::unchanged(Vec::new())),
        },

        WriteQuery::DetachDeleteCi { id } => {
            let removed = state.remove_ci(&id);
            let row = Record::new()
                .with("deleted_count", usize::from(removed.is_some()))
                .with("relationships_removed", removed.unwrap_or(0));
            Ok(WriteOutcome {
                rows: vec![row],
                changed: removed.is_some(),
            })
        }

        WriteQuery::CreateRelationship { relationship } => {
            let row = Record::new().with_serialized("relationship", &relationship)?;
            let rel_id = relationship.id.clone();
            match state.insert_relationship(relationship) {
                Ok(()) => Ok(WriteOutcome::changed(vec![row])),
                Err(InsertEdgeError::MissingEndpoint) => Ok(WriteOutcome::unchanged(Vec::new())),
                Err(InsertEdgeError::DuplicateId) => Err(Error::ConstraintViolation(format!(
                    "a relationship with id '{rel_id}' already exists"
                ))),
            }
        }

        WriteQuery::DeleteRelationship { id } => {
            let removed = state.remove_relationship(&id).is_some();
            Ok(WriteOutcome {
                rows: vec![Record::new().with("deleted_count", usize::from(removed))],
                changed: removed,
            })
        }
    }
}
