//! # retrace-core
//!
//! Core types and pure logic for Retrace.
//!
//! This crate has no I/O. It provides:
//! - The tracked record model (`Record`, `RecordId`, the `Tracked` trait)
//! - The persisted `HistoryEntry` shape
//! - Structural diffing of a record's previous and incoming state
//! - Hydration: replaying stored diffs into historical snapshots
//! - The write-once registry of tracked record types
//! - Cross-cutting error types

pub mod diff;
pub mod errors;
pub mod history;
pub mod hydrate;
pub mod record;
pub mod registry;

pub use diff::{EmptyIncomingPolicy, compute_update_diff, diff};
pub use errors::CoreError;
pub use history::HistoryEntry;
pub use hydrate::hydrate;
pub use record::{Record, RecordId, Tracked, record_id, to_record};
pub use registry::{HistoryRegistry, RegistryBuilder, TrackedType};
