use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordId};

/// One recorded change to a tracked record.
///
/// Created only as a side effect of an update whose diff is non-empty, and
/// never mutated afterwards. `diff` holds the changed fields with their new
/// values.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub origin: RecordId,
    pub diff: Record,
    pub history_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A history entry before the storage layer assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub origin: RecordId,
    pub diff: Record,
    pub history_details: Option<serde_json::Value>,
}

impl NewHistoryEntry {
    /// Attach the storage-assigned fields.
    #[must_use]
    pub fn persisted(self, id: i64, created_at: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            id,
            origin: self.origin,
            diff: self.diff,
            history_details: self.history_details,
            created_at,
        }
    }
}
