//! JSONL export of a type's history.
//!
//! One `HistoryEntry` per line, oldest first, in the persisted camelCase
//! shape. Exported files can be read back with [`read_jsonl`] and hydrated
//! without a database.

use std::path::Path;

use retrace_core::TrackedType;
use retrace_core::history::HistoryEntry;

use crate::error::DatabaseError;
use crate::service::HistoryService;

impl HistoryService {
    /// Write every entry of `ty` to `path`, replacing any existing file.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the type is unknown, the query fails, or the
    /// file cannot be written.
    pub async fn export_jsonl(
        &self,
        ty: TrackedType,
        path: &Path,
    ) -> Result<usize, DatabaseError> {
        let repo = self.history(ty)?;
        let entries = repo.list_all().await?;
        serde_jsonlines::write_json_lines(path, &entries)
            .map_err(|e| DatabaseError::Other(e.into()))?;
        tracing::debug!(
            table = repo.table(),
            entries = entries.len(),
            path = %path.display(),
            "history exported"
        );
        Ok(entries.len())
    }
}

/// Read entries previously written by [`HistoryService::export_jsonl`].
///
/// # Errors
///
/// Returns `DatabaseError` if the file cannot be read or a line is not a
/// valid entry.
pub fn read_jsonl(path: &Path) -> Result<Vec<HistoryEntry>, DatabaseError> {
    serde_jsonlines::json_lines(path)
        .map_err(|e| DatabaseError::Other(e.into()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DatabaseError::Other(e.into()))
}
