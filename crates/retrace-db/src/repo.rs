//! History repository scoped to one tracked type.
//!
//! Obtained from `HistoryService::history` or `history_by_name`. Entries are
//! always returned oldest first (ascending `id`) unless a method says
//! otherwise, which is the order `hydrate` requires.

use chrono::{DateTime, Utc};
use retrace_core::history::{HistoryEntry, NewHistoryEntry};
use retrace_core::registry::RegisteredType;
use retrace_core::{Record, RecordId, TrackedType, record_id};

use crate::error::DatabaseError;
use crate::helpers::{ENTRY_COLUMNS, collect_entries, parse_datetime, row_to_entry};

pub struct HistoryRepo<'a> {
    conn: &'a libsql::Connection,
    ty: TrackedType,
    registered: &'a RegisteredType,
}

impl<'a> HistoryRepo<'a> {
    pub(crate) const fn new(
        conn: &'a libsql::Connection,
        ty: TrackedType,
        registered: &'a RegisteredType,
    ) -> Self {
        Self {
            conn,
            ty,
            registered,
        }
    }

    #[must_use]
    pub const fn tracked_type(&self) -> TrackedType {
        self.ty
    }

    /// Normalized name of the tracked type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.registered.name()
    }

    #[must_use]
    pub fn table(&self) -> &str {
        self.registered.table()
    }

    /// All entries for one record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a row is malformed.
    pub async fn list_for_origin(
        &self,
        origin: &RecordId,
    ) -> Result<Vec<HistoryEntry>, DatabaseError> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM {} WHERE origin = ?1 ORDER BY id ASC",
                    self.table()
                ),
                [origin.to_storage_key()],
            )
            .await?;
        collect_entries(rows).await
    }

    /// The newest `limit` entries for one record, still returned oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a row is malformed.
    pub async fn list_for_origin_limited(
        &self,
        origin: &RecordId,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, DatabaseError> {
        let table = self.table();
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM (
                         SELECT {ENTRY_COLUMNS} FROM {table} WHERE origin = ?1
                         ORDER BY id DESC LIMIT ?2
                     ) ORDER BY id ASC"
                ),
                libsql::params![origin.to_storage_key(), limit],
            )
            .await?;
        collect_entries(rows).await
    }

    /// Fetch one entry by its id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no entry has that id.
    pub async fn get(&self, id: i64) -> Result<HistoryEntry, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {ENTRY_COLUMNS} FROM {} WHERE id = ?1", self.table()),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_entry(&row)
    }

    /// Number of entries recorded for one record.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_for_origin(&self, origin: &RecordId) -> Result<u64, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT COUNT(*) FROM {} WHERE origin = ?1", self.table()),
                [origin.to_storage_key()],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let count = row.get::<i64>(0)?;
        u64::try_from(count)
            .map_err(|_| DatabaseError::InvalidState(format!("negative count {count}")))
    }

    /// Most recent entries across all records of this type, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a row is malformed.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<HistoryEntry>, DatabaseError> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM {} ORDER BY id DESC LIMIT ?1",
                    self.table()
                ),
                [limit],
            )
            .await?;
        collect_entries(rows).await
    }

    /// Every entry of this type, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a row is malformed.
    pub async fn list_all(&self) -> Result<Vec<HistoryEntry>, DatabaseError> {
        let rows = self
            .conn
            .query(
                &format!("SELECT {ENTRY_COLUMNS} FROM {} ORDER BY id ASC", self.table()),
                (),
            )
            .await?;
        collect_entries(rows).await
    }

    /// Load the history of `current` and replay it into past snapshots.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if `current` has no usable id or the query fails.
    pub async fn hydrate(&self, current: &Record) -> Result<Vec<Record>, DatabaseError> {
        let origin = record_id(current)?;
        let history = self.list_for_origin(&origin).await?;
        Ok(retrace_core::hydrate(current, &history)?)
    }
}

/// Insert one entry into `table` on `conn`, assigning `id` and `created_at`.
///
/// `conn` may be a transaction (via deref) so the write can share a commit
/// with the host's update.
pub(crate) async fn insert_entry(
    conn: &libsql::Connection,
    table: &str,
    entry: NewHistoryEntry,
) -> Result<HistoryEntry, DatabaseError> {
    let created_at = next_created_at(conn, table).await?;
    let diff_json = serde_json::to_string(&entry.diff).map_err(|e| DatabaseError::Other(e.into()))?;
    let details_json = entry
        .history_details
        .as_ref()
        .map(std::string::ToString::to_string);

    conn.execute(
        &format!(
            "INSERT INTO {table} (origin, diff, history_details, created_at) VALUES (?1, ?2, ?3, ?4)"
        ),
        libsql::params![
            entry.origin.to_storage_key(),
            diff_json,
            details_json,
            created_at.to_rfc3339()
        ],
    )
    .await?;

    let id = conn.last_insert_rowid();
    Ok(entry.persisted(id, created_at))
}

/// Current time, clamped so `created_at` never runs behind the newest row.
///
/// Keeps `createdAt` order in step with `id` order when the clock steps back.
async fn next_created_at(
    conn: &libsql::Connection,
    table: &str,
) -> Result<DateTime<Utc>, DatabaseError> {
    let now = Utc::now();
    let mut rows = conn
        .query(
            &format!("SELECT created_at FROM {table} ORDER BY id DESC LIMIT 1"),
            (),
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(now.max(parse_datetime(&row.get::<String>(0)?)?)),
        None => Ok(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::UpdateEvent;
    use crate::test_support::helpers::{rec, user_service};
    use pretty_assertions::assert_eq;
    use retrace_core::EmptyIncomingPolicy;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::integer_id(json!(1), RecordId::Int(1), RecordId::Text("1".into()))]
    #[case::text_id(json!("1"), RecordId::Text("1".into()), RecordId::Int(1))]
    #[tokio::test]
    async fn origins_keep_their_json_type(
        #[case] id: serde_json::Value,
        #[case] owner: RecordId,
        #[case] lookalike: RecordId,
    ) {
        let (svc, users) = user_service(EmptyIncomingPolicy::Reject).await;
        let previous = rec(json!({"id": id.clone(), "name": "a"}));
        let incoming = rec(json!({"id": id, "name": "b"}));
        svc.record_update(users, &UpdateEvent::new(&previous, &incoming))
            .await
            .unwrap();

        let repo = svc.history(users).unwrap();
        assert_eq!(repo.count_for_origin(&owner).await.unwrap(), 1);
        assert_eq!(repo.count_for_origin(&lookalike).await.unwrap(), 0);
        assert_eq!(repo.list_for_origin(&owner).await.unwrap()[0].origin, owner);
    }

    #[tokio::test]
    async fn created_at_never_runs_behind_newest_entry() {
        let (svc, users) = user_service(EmptyIncomingPolicy::Reject).await;
        let ahead = "2099-01-01T00:00:00+00:00";
        svc.db()
            .conn()
            .execute(
                "INSERT INTO user_history (origin, diff, created_at) VALUES ('1', '{\"n\":1}', ?1)",
                [ahead],
            )
            .await
            .unwrap();

        let previous = rec(json!({"id": 1, "n": 1}));
        let incoming = rec(json!({"id": 1, "n": 2}));
        let entry = svc
            .record_update(users, &UpdateEvent::new(&previous, &incoming))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(entry.created_at, parse_datetime(ahead).unwrap());
        let entries = svc
            .history(users)
            .unwrap()
            .list_for_origin(&RecordId::Int(1))
            .await
            .unwrap();
        assert!(entries.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn get_unknown_entry_is_no_result() {
        let (svc, users) = user_service(EmptyIncomingPolicy::Reject).await;
        let err = svc.history(users).unwrap().get(99).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NoResult));
    }

    #[tokio::test]
    async fn repo_hydrate_uses_current_id() {
        let (svc, users) = user_service(EmptyIncomingPolicy::Reject).await;
        let v1 = rec(json!({"id": 4, "city": "Leeds"}));
        let v2 = rec(json!({"id": 4, "city": "York"}));
        svc.record_update(users, &UpdateEvent::new(&v1, &v2))
            .await
            .unwrap();

        let snapshots = svc.history(users).unwrap().hydrate(&v1).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0]["city"], json!("York"));
        assert_eq!(snapshots[0]["originId"], json!(4));
    }
}
