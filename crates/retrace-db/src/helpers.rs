//! Row-to-entry parsing helpers.
//!
//! History rows store JSON as TEXT and timestamps as RFC 3339 strings. These
//! helpers isolate the conversions so every query maps rows the same way.

use chrono::{DateTime, Utc};
use retrace_core::history::HistoryEntry;
use retrace_core::record::{Record, RecordId, value_to_record};

use crate::error::DatabaseError;

/// Columns selected for every history query, in `row_to_entry` order.
pub const ENTRY_COLUMNS: &str = "id, origin, diff, history_details, created_at";

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// `created_at` is always written as RFC 3339 (`"2026-02-09T14:30:00+00:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string is not RFC 3339.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Extract an optional JSON value from a TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string contains invalid JSON.
pub fn parse_optional_json(s: Option<&str>) -> Result<Option<serde_json::Value>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => {
            let val = serde_json::from_str(s)
                .map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))?;
            Ok(Some(val))
        }
        _ => Ok(None),
    }
}

/// Parse a TEXT column holding a JSON object.
///
/// # Errors
///
/// Returns `DatabaseError::Query` for invalid JSON and `DatabaseError::Core`
/// if the JSON is not an object.
pub fn parse_record(s: &str) -> Result<Record, DatabaseError> {
    let value = serde_json::from_str(s)
        .map_err(|e| DatabaseError::Query(format!("Invalid JSON in diff column: {e}")))?;
    Ok(value_to_record(value)?)
}

/// Map a row selected with [`ENTRY_COLUMNS`] to a `HistoryEntry`.
///
/// # Errors
///
/// Returns `DatabaseError` if any column is missing or malformed.
pub fn row_to_entry(row: &libsql::Row) -> Result<HistoryEntry, DatabaseError> {
    Ok(HistoryEntry {
        id: row.get::<i64>(0)?,
        origin: RecordId::from_storage_key(&row.get::<String>(1)?)?,
        diff: parse_record(&row.get::<String>(2)?)?,
        history_details: parse_optional_json(get_opt_string(row, 3)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

/// Drain a result set into history entries.
///
/// # Errors
///
/// Returns `DatabaseError` if fetching or parsing any row fails.
pub async fn collect_entries(mut rows: libsql::Rows) -> Result<Vec<HistoryEntry>, DatabaseError> {
    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        entries.push(row_to_entry(&row)?);
    }
    Ok(entries)
}
