//! Async JSON Lines support for the Constellation CMDB.
//!
//! Graph snapshots are stored one JSON document per line. This crate provides
//! buffered async reading and writing of that format, resilient loading that
//! skips damaged lines instead of failing, and crash-safe atomic rewrites.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::{write_jsonl_atomic, write_jsonl_atomic_iter};
pub use error::{Error, Result};
pub use reader::{read_jsonl_resilient, JsonlReader};
pub use warning::Warning;
pub use writer::JsonlWriter;
