//! Error types for constellation-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for constellation-jsonl operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line could not be interpreted as a JSONL record.
    #[error("Invalid JSONL format at line {line_number}: {reason}")]
    InvalidFormat {
        /// The 1-based line number of the offending line.
        line_number: usize,
        /// Why the line was rejected.
        reason: String,
    },
}

/// A specialized Result type for constellation-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
