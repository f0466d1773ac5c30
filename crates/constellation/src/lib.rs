//! Constellation - a configuration management database.
//!
//! Tracks configuration items (CIs) and the typed, directed relationships
//! between them, and answers blast-radius, dependency and single-point-of-
//! failure questions over the resulting graph.
//!
//! The crate is layered leaves-first:
//!
//! - [`domain`]: CI and relationship value types and their enumerations
//! - [`store`]: the [`GraphStore`](store::GraphStore) contract and the
//!   in-memory petgraph backend with optional JSONL snapshots
//! - [`registry`]: CRUD over CIs and relationships
//! - [`analysis`]: impact, dependency and bus-factor traversals
//! - [`app`]: the facade that owns the store handle
//!
//! The `constellation` binary wraps the facade in a small CLI.

#![forbid(unsafe_code)]

pub mod analysis;
pub mod app;
pub mod domain;
pub mod error;
pub mod registry;
pub mod store;

pub mod cli;
pub mod commands;
pub mod config;

pub(crate) mod output;
