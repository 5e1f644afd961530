//! Reconstruct historical snapshots from stored diffs.
//!
//! Diffs are forward diffs (older to newer), so hydration folds them left to
//! right starting from the current record. Each emitted snapshot carries the
//! entry's own `id`, `historyDetails` and `createdAt`, plus `originId` pointing
//! back at the tracked record.
//!
//! Callers must pass `history` oldest first and for the same record as
//! `current`. Neither is checked.

use serde_json::Value;

use crate::errors::CoreError;
use crate::history::HistoryEntry;
use crate::record::{ID_FIELD, Record, record_id};

pub const ORIGIN_ID_FIELD: &str = "originId";
pub const HISTORY_DETAILS_FIELD: &str = "historyDetails";
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Replay `history` onto `current`, producing one snapshot per entry.
///
/// # Errors
///
/// Returns `CoreError::MissingId` / `CoreError::InvalidRecord` if `current`
/// has no usable `id`.
pub fn hydrate(current: &Record, history: &[HistoryEntry]) -> Result<Vec<Record>, CoreError> {
    if history.is_empty() {
        return Ok(Vec::new());
    }

    let origin = record_id(current)?;
    let mut pivot = current.clone();
    pivot.insert(ORIGIN_ID_FIELD.to_string(), origin.to_value());

    let mut snapshots = Vec::with_capacity(history.len());
    for entry in history {
        for (field, value) in &entry.diff {
            pivot.insert(field.clone(), value.clone());
        }
        pivot.insert(ID_FIELD.to_string(), Value::from(entry.id));
        pivot.insert(
            HISTORY_DETAILS_FIELD.to_string(),
            entry.history_details.clone().unwrap_or(Value::Null),
        );
        pivot.insert(
            CREATED_AT_FIELD.to_string(),
            serde_json::to_value(entry.created_at).map_err(|e| CoreError::Other(e.into()))?,
        );
        snapshots.push(pivot.clone());
    }

    Ok(snapshots)
}
