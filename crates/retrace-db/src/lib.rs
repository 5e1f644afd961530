//! # retrace-db
//!
//! libSQL persistence for Retrace change history.
//!
//! Every registered record type gets its own `<name>_history` table. The
//! [`HistoryService`] ties a database handle to a frozen
//! [`retrace_core::HistoryRegistry`] and provides:
//! - Diff-and-Record for updates of tracked records (`record_update`,
//!   per-type [`UpdateHook`]s, and the transactional `update_with_history`)
//! - Scoped history retrieval through [`HistoryRepo`]
//! - Hydration of stored history into past snapshots
//! - JSONL export of a type's history

pub mod error;
pub mod export;
pub mod helpers;
mod migrations;
pub mod recorder;
pub mod repo;
pub mod service;

#[cfg(test)]
mod test_support;

pub use error::DatabaseError;
pub use export::read_jsonl;
pub use migrations::history_table_ddl;
pub use recorder::{UpdateEvent, UpdateHook, UpdateOutcome};
pub use repo::HistoryRepo;
pub use service::HistoryService;

use libsql::Builder;

/// Database handle holding the history tables.
pub struct HistoryDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl HistoryDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// History tables are created separately by [`HistoryDb::install`].
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        Ok(Self { db, conn })
    }

    /// Access the underlying libSQL connection.
    ///
    /// Host applications run their own statements on this connection so that
    /// record updates and history writes share transactions.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Whether a table with the given name exists.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the catalog query fails.
    pub async fn table_exists(&self, table: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_core::RegistryBuilder;

    #[tokio::test]
    async fn install_creates_one_table_per_type() {
        let db = HistoryDb::open_local(":memory:").await.unwrap();
        let mut builder = RegistryBuilder::new();
        builder.register("User").unwrap();
        builder.register("invoice").unwrap();
        let registry = builder.build();

        db.install(&registry).await.unwrap();

        assert!(db.table_exists("user_history").await.unwrap());
        assert!(db.table_exists("invoice_history").await.unwrap());
        assert!(!db.table_exists("ghost_history").await.unwrap());
    }

    #[tokio::test]
    async fn install_is_idempotent() {
        let db = HistoryDb::open_local(":memory:").await.unwrap();
        let mut builder = RegistryBuilder::new();
        builder.register("user").unwrap();
        let registry = builder.build();

        db.install(&registry).await.unwrap();
        db.install(&registry).await.unwrap();
    }

    #[tokio::test]
    async fn empty_diff_rejected_by_schema() {
        let db = HistoryDb::open_local(":memory:").await.unwrap();
        let mut builder = RegistryBuilder::new();
        builder.register("user").unwrap();
        db.install(&builder.build()).await.unwrap();

        let result = db
            .conn()
            .execute(
                "INSERT INTO user_history (origin, diff, created_at) VALUES ('1', '{}', '2026-01-01T00:00:00Z')",
                (),
            )
            .await;
        assert!(result.is_err(), "empty diff must violate the CHECK constraint");
    }
}
