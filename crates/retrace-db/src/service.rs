//! Service layer tying the history database to the type registry.
//!
//! `HistoryService` owns a `HistoryDb` and a frozen `HistoryRegistry`. It is
//! the storage factory for tracked types: repositories and update hooks are
//! handed out per type, and lookups for types the registry does not know fail
//! with `CoreError::UnregisteredType`.
//!
//! All history writes share one connection. A service-wide write lock keeps a
//! standalone `record_update` from landing inside the open transaction of an
//! `update_with_history`, where a later rollback would discard it.

use std::sync::Arc;

use retrace_core::registry::RegisteredType;
use retrace_core::{EmptyIncomingPolicy, HistoryRegistry, Record, TrackedType};
use tokio::sync::Mutex;

use crate::HistoryDb;
use crate::error::DatabaseError;
use crate::repo::HistoryRepo;

pub struct HistoryService {
    db: HistoryDb,
    registry: Arc<HistoryRegistry>,
    empty_incoming: EmptyIncomingPolicy,
    pub(crate) write_lock: Mutex<()>,
}

impl HistoryService {
    /// Wrap an open database, installing the history table of every
    /// registered type.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Migration` if a history table cannot be created.
    pub async fn new(
        db: HistoryDb,
        registry: impl Into<Arc<HistoryRegistry>>,
        empty_incoming: EmptyIncomingPolicy,
    ) -> Result<Self, DatabaseError> {
        let registry = registry.into();
        db.install(&registry).await?;
        tracing::debug!(
            types = registry.len(),
            policy = empty_incoming.as_str(),
            "history service ready"
        );
        Ok(Self {
            db,
            registry,
            empty_incoming,
            write_lock: Mutex::new(()),
        })
    }

    /// Open a local database and build the service on it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the schema
    /// cannot be installed.
    pub async fn open_local(
        path: &str,
        registry: impl Into<Arc<HistoryRegistry>>,
        empty_incoming: EmptyIncomingPolicy,
    ) -> Result<Self, DatabaseError> {
        let db = HistoryDb::open_local(path).await?;
        Self::new(db, registry, empty_incoming).await
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &HistoryDb {
        &self.db
    }

    /// The registry this service was built with.
    #[must_use]
    pub fn registry(&self) -> &HistoryRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn empty_incoming(&self) -> EmptyIncomingPolicy {
        self.empty_incoming
    }

    /// Resolve a handle to its registration.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core(CoreError::UnregisteredType)` for handles
    /// this service's registry did not issue.
    pub fn resolve(&self, ty: TrackedType) -> Result<&RegisteredType, DatabaseError> {
        Ok(self.registry.resolve(ty)?)
    }

    /// History storage scoped to one tracked type.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core(CoreError::UnregisteredType)` for unknown
    /// handles.
    pub fn history(&self, ty: TrackedType) -> Result<HistoryRepo<'_>, DatabaseError> {
        let registered = self.resolve(ty)?;
        Ok(HistoryRepo::new(self.db.conn(), ty, registered))
    }

    /// History storage looked up by type name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core(CoreError::UnregisteredType)` if no type
    /// with that name was registered.
    pub fn history_by_name(&self, name: &str) -> Result<HistoryRepo<'_>, DatabaseError> {
        let ty = self.registry.lookup(name)?;
        self.history(ty)
    }

    /// Reconstruct every past snapshot of `current` from its stored history.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the type is unknown, `current` has no id, or
    /// the history query fails.
    pub async fn hydrate(
        &self,
        ty: TrackedType,
        current: &Record,
    ) -> Result<Vec<Record>, DatabaseError> {
        self.history(ty)?.hydrate(current).await
    }
}
