//! Error types for constellation operations.

use crate::domain::{CiId, RelationshipId};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for constellation operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input was malformed or out of range.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A CI that must exist was not found.
    #[error("CI not found: {0}")]
    CiNotFound(CiId),

    /// A relationship that must exist was not found.
    #[error("Relationship not found: {0}")]
    RelationshipNotFound(RelationshipId),

    /// A write would break a graph invariant (missing endpoint, duplicate id).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The graph store is disconnected or could not be acquired in time.
    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),

    /// Storage-level failure such as a malformed result row.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Input validation failures.
///
/// These are detected before any statement reaches the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required text field was empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Field name.
        field: &'static str,
    },

    /// A text field exceeded its maximum length.
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
        /// Actual length in characters.
        actual: usize,
    },

    /// Relationship weight outside the accepted range.
    #[error("weight must be a finite number between {min} and {max} (got {value})")]
    WeightOutOfRange {
        /// Supplied weight.
        value: f64,
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
    },

    /// A page or result limit outside its accepted range.
    #[error("{field} must be between {min} and {max} (got {value})")]
    LimitOutOfRange {
        /// Parameter name.
        field: &'static str,
        /// Supplied value.
        value: usize,
        /// Lower bound (inclusive).
        min: usize,
        /// Upper bound (inclusive).
        max: usize,
    },

    /// A risk likelihood or impact score outside its accepted range.
    #[error("{field} must be between {min} and {max} (got {value})")]
    ScoreOutOfRange {
        /// Score name.
        field: &'static str,
        /// Supplied value.
        value: u8,
        /// Lower bound (inclusive).
        min: u8,
        /// Upper bound (inclusive).
        max: u8,
    },

    /// A string did not name any member of a closed enumeration.
    #[error("invalid {field} '{value}'")]
    InvalidEnumValue {
        /// Enumeration name.
        field: &'static str,
        /// Rejected input.
        value: String,
    },

    /// An update tried to change an immutable field.
    #[error("field '{0}' cannot be updated")]
    ImmutableField(String),

    /// An update named a field outside the updatable allowlist.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// An update payload carried a value of the wrong shape.
    #[error("invalid value for '{field}': {reason}")]
    InvalidFieldValue {
        /// Field name.
        field: String,
        /// Decoder message.
        reason: String,
    },

    /// An update payload was not a JSON object.
    #[error("update payload must be a JSON object")]
    NotAnObject,

    /// An update payload contained no fields.
    #[error("update contains no fields")]
    EmptyUpdate,
}

/// Failures inside the store adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A result row lacked an expected column.
    #[error("column '{0}' missing from result row")]
    MissingColumn(String),

    /// A column value could not be decoded into the expected type.
    #[error("failed to decode column '{column}': {source}")]
    Decode {
        /// Column name.
        column: String,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// A statement returned rows in an unexpected shape.
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),

    /// Reading or writing the JSONL snapshot failed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] constellation_jsonl::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.constellation` directory found from the starting directory upward.
    #[error("Not a constellation repository (searched upward from {})", .0.display())]
    NotInitialized(PathBuf),

    /// `init` found an existing `.constellation` directory.
    #[error("Constellation is already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    /// The config file could not be parsed or serialized.
    #[error("invalid config file {}: {source}", path.display())]
    Yaml {
        /// Config file path.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A config value was out of range.
    #[error("{0}")]
    Invalid(String),
}

/// A specialized Result type for constellation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_error() {
        let err: Error = ValidationError::EmptyUpdate.into();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyUpdate)));
        assert_eq!(err.to_string(), "Validation error: update contains no fields");
    }

    #[test]
    fn limit_message_names_bounds() {
        let err = ValidationError::LimitOutOfRange {
            field: "limit",
            value: 0,
            min: 1,
            max: 1000,
        };
        assert_eq!(err.to_string(), "limit must be between 1 and 1000 (got 0)");
    }

    #[test]
    fn score_message_names_bounds() {
        let err = ValidationError::ScoreOutOfRange {
            field: "likelihood",
            value: 6,
            min: 1,
            max: 5,
        };
        assert_eq!(err.to_string(), "likelihood must be between 1 and 5 (got 6)");
    }

    #[test]
    fn not_initialized_mentions_start_directory() {
        let err = ConfigError::NotInitialized(PathBuf::from("/tmp/work"));
        assert!(err.to_string().contains("/tmp/work"));
    }
}
