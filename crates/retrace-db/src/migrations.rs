//! Per-type history schema installation.
//!
//! The history table DDL is embedded at compile time as a template and
//! instantiated once per registered type. All statements use `IF NOT EXISTS`,
//! so installing an already-installed registry is a no-op.

use retrace_core::HistoryRegistry;

use crate::HistoryDb;
use crate::error::DatabaseError;

const HISTORY_TABLE_TEMPLATE: &str = include_str!("../migrations/001_history_table.sql");

/// DDL creating the history table and origin index for `table`.
#[must_use]
pub fn history_table_ddl(table: &str) -> String {
    HISTORY_TABLE_TEMPLATE.replace("{table}", table)
}

impl HistoryDb {
    /// Create the history table of every registered type.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Migration` naming the table that failed.
    pub async fn install(&self, registry: &HistoryRegistry) -> Result<(), DatabaseError> {
        for (_, registered) in registry.iter() {
            self.conn
                .execute_batch(&history_table_ddl(registered.table()))
                .await
                .map_err(|e| DatabaseError::Migration(format!("{}: {e}", registered.table())))?;
            tracing::debug!(
                record_type = registered.name(),
                table = registered.table(),
                "history table installed"
            );
        }
        Ok(())
    }
}
