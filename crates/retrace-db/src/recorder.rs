//! Diff-and-Record: persist a history entry for each effective update.
//!
//! Every entry point follows the same protocol:
//! 1. Read the origin id from the previous state
//! 2. Diff incoming against previous (subject to the empty-incoming policy)
//! 3. Return `None` without writing if nothing changed
//! 4. Otherwise insert exactly one history row
//!
//! `update_with_history` additionally runs the host's UPDATE in the same
//! transaction as the insert, so a record never changes without its history
//! and history never outlives a failed update.

use retrace_core::history::{HistoryEntry, NewHistoryEntry};
use retrace_core::{Record, TrackedType, compute_update_diff, record_id};
use serde::Serialize;

use crate::error::DatabaseError;
use crate::repo::insert_entry;
use crate::service::HistoryService;

/// An in-flight update of a tracked record.
#[derive(Debug, Clone, Copy)]
pub struct UpdateEvent<'a> {
    /// State before the update. Must carry the record's `id`.
    pub previous: &'a Record,
    /// State supplied for the update. `None` means no payload.
    pub incoming: Option<&'a Record>,
    /// Caller annotation stored as `historyDetails`.
    pub details: Option<&'a serde_json::Value>,
}

impl<'a> UpdateEvent<'a> {
    #[must_use]
    pub const fn new(previous: &'a Record, incoming: &'a Record) -> Self {
        Self {
            previous,
            incoming: Some(incoming),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: &'a serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Result of a transactional update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    /// Rows changed by the host's UPDATE statement.
    pub rows_affected: u64,
    /// The history entry written, or `None` for a no-op update.
    pub entry: Option<HistoryEntry>,
}

/// Update-interception hook bound to one tracked type.
///
/// Await [`UpdateHook::before_update`] before committing the update it
/// observes. It writes on the service's connection, so a host transaction
/// open on that connection covers the history row too. It waits for any
/// `update_with_history` in flight to commit or roll back first.
pub struct UpdateHook<'a> {
    service: &'a HistoryService,
    ty: TrackedType,
    table: &'a str,
}

impl UpdateHook<'_> {
    #[must_use]
    pub const fn tracked_type(&self) -> TrackedType {
        self.ty
    }

    /// Diff-and-Record for the bound type.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the previous state has no id, the incoming
    /// payload is rejected by policy, or the insert fails.
    pub async fn before_update(
        &self,
        event: &UpdateEvent<'_>,
    ) -> Result<Option<HistoryEntry>, DatabaseError> {
        let _write = self.service.write_lock.lock().await;
        self.service
            .record_on(self.service.db().conn(), self.table, event)
            .await
    }
}

impl HistoryService {
    /// Hook that records history for updates of `ty`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core(CoreError::UnregisteredType)` for unknown
    /// handles.
    pub fn hook(&self, ty: TrackedType) -> Result<UpdateHook<'_>, DatabaseError> {
        let registered = self.resolve(ty)?;
        Ok(UpdateHook {
            service: self,
            ty,
            table: registered.table(),
        })
    }

    /// Record the history of one update of `ty`.
    ///
    /// Returns `Ok(None)` without writing when the update changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the type is unknown, the previous state has
    /// no id, the incoming payload is rejected by policy, or the insert fails.
    pub async fn record_update(
        &self,
        ty: TrackedType,
        event: &UpdateEvent<'_>,
    ) -> Result<Option<HistoryEntry>, DatabaseError> {
        self.hook(ty)?.before_update(event).await
    }

    /// Apply the host's UPDATE and record its history atomically.
    ///
    /// The history row is written first, then `sql` runs with `params`. Both
    /// commit together. If the statement fails or matches no row, both are
    /// rolled back; a zero-row update reports `DatabaseError::NoResult`.
    /// Other history writes on this service wait until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` for any failure of the diff, the history insert,
    /// the host statement, or the commit.
    pub async fn update_with_history(
        &self,
        ty: TrackedType,
        event: &UpdateEvent<'_>,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<UpdateOutcome, DatabaseError> {
        let table = self.resolve(ty)?.table();
        let _write = self.write_lock.lock().await;
        let tx = self.db().conn().transaction().await?;

        let result = async {
            let entry = self.record_on(&tx, table, event).await?;
            let rows_affected = tx.execute(sql, params).await?;
            if rows_affected == 0 {
                return Err(DatabaseError::NoResult);
            }
            Ok(UpdateOutcome {
                rows_affected,
                entry,
            })
        }
        .await;

        match result {
            Ok(outcome) => {
                tx.commit().await?;
                Ok(outcome)
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::warn!(%rollback_error, table, "rollback after failed update did not complete");
                }
                Err(error)
            }
        }
    }

    pub(crate) async fn record_on(
        &self,
        conn: &libsql::Connection,
        table: &str,
        event: &UpdateEvent<'_>,
    ) -> Result<Option<HistoryEntry>, DatabaseError> {
        let origin = record_id(event.previous)?;
        let diff = compute_update_diff(event.previous, event.incoming, self.empty_incoming())?;

        if diff.is_empty() {
            tracing::debug!(table, %origin, "update changed nothing; no history written");
            return Ok(None);
        }

        let entry = insert_entry(
            conn,
            table,
            NewHistoryEntry {
                origin,
                diff,
                history_details: event.details.filter(|d| !d.is_null()).cloned(),
            },
        )
        .await?;

        tracing::debug!(
            table,
            origin = %entry.origin,
            entry_id = entry.id,
            fields = entry.diff.len(),
            "history entry recorded"
        );
        Ok(Some(entry))
    }
}
