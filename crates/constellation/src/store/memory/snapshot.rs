//! JSONL snapshots of the whole graph.
//!
//! One line per CI followed by one line per relationship, each tagged with
//! `kind`. Loading is resilient: damaged or inconsistent lines are skipped
//! and reported as [`LoadWarning`]s.

use super::state::{GraphState, InsertEdgeError};
use crate::domain::{Ci, CiId, Relationship, RelationshipId};
use crate::error::{Result, StorageError};
use constellation_jsonl::{read_jsonl_resilient, write_jsonl_atomic_iter, Warning as JsonlWarning};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SnapshotLine {
    Ci(Ci),
    Relationship(Relationship),
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SnapshotLineRef<'a> {
    Ci(&'a Ci),
    Relationship(&'a Relationship),
}

/// Non-fatal problems found while loading a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line was not valid JSON or not a recognizable record.
    MalformedJson {
        /// 1-based line number.
        line_number: usize,
        /// Parser message.
        error: String,
    },

    /// A line was skipped by the line reader.
    SkippedLine {
        /// 1-based line number.
        line_number: usize,
        /// Reason.
        reason: String,
    },

    /// A CI failed validation and was not loaded.
    InvalidCi {
        /// CI id.
        ci_id: CiId,
        /// Validation message.
        error: String,
    },

    /// A CI id appeared more than once; the first occurrence was kept.
    DuplicateCi {
        /// CI id.
        ci_id: CiId,
    },

    /// A relationship failed validation and was not loaded.
    InvalidRelationship {
        /// Relationship id.
        relationship_id: RelationshipId,
        /// Validation message.
        error: String,
    },

    /// A relationship referenced a CI that is not in the snapshot.
    DanglingRelationship {
        /// Relationship id.
        relationship_id: RelationshipId,
        /// Edge tail.
        source_id: CiId,
        /// Edge head.
        target_id: CiId,
    },

    /// A relationship id appeared more than once; the first occurrence was kept.
    DuplicateRelationship {
        /// Relationship id.
        relationship_id: RelationshipId,
    },
}

impl From<JsonlWarning> for LoadWarning {
    fn from(warning: JsonlWarning) -> Self {
        match warning {
            JsonlWarning::MalformedJson { line_number, error } => {
                Self::MalformedJson { line_number, error }
            }
            JsonlWarning::SkippedLine {
                line_number,
                reason,
            } => Self::SkippedLine {
                line_number,
                reason,
            },
        }
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed record: {error}")
            }
            Self::SkippedLine {
                line_number,
                reason,
            } => write!(f, "line {line_number}: skipped: {reason}"),
            Self::InvalidCi { ci_id, error } => write!(f, "invalid CI {ci_id}: {error}"),
            Self::DuplicateCi { ci_id } => write!(f, "duplicate CI {ci_id}"),
            Self::InvalidRelationship {
                relationship_id,
                error,
            } => write!(f, "invalid relationship {relationship_id}: {error}"),
            Self::DanglingRelationship {
                relationship_id,
                source_id,
                target_id,
            } => write!(
                f,
                "relationship {relationship_id} references missing CI ({source_id} -> {target_id})"
            ),
            Self::DuplicateRelationship { relationship_id } => {
                write!(f, "duplicate relationship {relationship_id}")
            }
        }
    }
}

/// Load a snapshot. A missing file is an empty graph.
pub(crate) async fn load(path: &Path) -> Result<(GraphState, Vec<LoadWarning>)> {
    let (lines, jsonl_warnings) = match read_jsonl_resilient::<SnapshotLine, _>(path).await {
        Ok(loaded) => loaded,
        Err(constellation_jsonl::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
            return Ok((GraphState::new(), Vec::new()));
        }
        Err(e) => return Err(StorageError::Snapshot(e).into()),
    };

    let mut warnings: Vec<LoadWarning> = jsonl_warnings.into_iter().map(Into::into).collect();
    let (cis, relationships): (Vec<_>, Vec<_>) = lines
        .into_iter()
        .partition(|line| matches!(line, SnapshotLine::Ci(_)));

    let mut state = GraphState::new();

    for line in cis {
        let SnapshotLine::Ci(ci) = line else { continue };
        if let Err(e) = ci.validate() {
            warnings.push(LoadWarning::InvalidCi {
                ci_id: ci.id.clone(),
                error: e.to_string(),
            });
            continue;
        }
        let ci_id = ci.id.clone();
        if !state.insert_ci(ci) {
            warnings.push(LoadWarning::DuplicateCi { ci_id });
        }
    }

    for line in relationships {
        let SnapshotLine::Relationship(rel) = line else {
            continue;
        };
        if let Err(e) = rel.validate() {
            warnings.push(LoadWarning::InvalidRelationship {
                relationship_id: rel.id.clone(),
                error: e.to_string(),
            });
            continue;
        }
        let (relationship_id, source_id, target_id) =
            (rel.id.clone(), rel.source_id.clone(), rel.target_id.clone());
        match state.insert_relationship(rel) {
            Ok(()) => {}
            Err(InsertEdgeError::MissingEndpoint) => {
                warnings.push(LoadWarning::DanglingRelationship {
                    relationship_id,
                    source_id,
                    target_id,
                });
            }
            Err(InsertEdgeError::DuplicateId) => {
                warnings.push(LoadWarning::DuplicateRelationship { relationship_id });
            }
        }
    }

    Ok((state, warnings))
}

/// Atomically rewrite the snapshot from `state`.
///
/// CIs are written sorted by id, then relationships by creation time and id.
pub(crate) async fn save(path: &Path, state: &GraphState) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut cis: Vec<&Ci> = state.cis().collect();
    cis.sort_by(|a, b| a.id.cmp(&b.id));
    let mut relationships: Vec<&Relationship> = state.relationships().collect();
    relationships.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let lines: Vec<SnapshotLineRef<'_>> = cis
        .into_iter()
        .map(SnapshotLineRef::Ci)
        .chain(relationships.into_iter().map(SnapshotLineRef::Relationship))
        .collect();

    write_jsonl_atomic_iter(path, lines)
        .await
        .map_err(StorageError::Snapshot)?;
    Ok(())
}
