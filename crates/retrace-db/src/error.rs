//! Database error types for retrace-db.

use retrace_core::CoreError;
use thiserror::Error;

/// Errors from history storage operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema installation failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row (or an affected row) but none was found.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Record, diff or registry error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether this error reports a lookup of a never-registered type.
    #[must_use]
    pub const fn is_unregistered(&self) -> bool {
        matches!(self, Self::Core(CoreError::UnregisteredType { .. }))
    }
}
