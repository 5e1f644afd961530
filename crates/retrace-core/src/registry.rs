//! Write-once registry of tracked record types.
//!
//! Types are registered on a [`RegistryBuilder`] during startup. Each
//! registration returns a [`TrackedType`] handle used for all later lookups.
//! [`RegistryBuilder::build`] freezes the table into an immutable
//! [`HistoryRegistry`] that can be shared freely.
//!
//! Lookup by name (case-insensitive) is kept as a fallback for callers that
//! only know a type by its string name, e.g. the CLI.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::CoreError;
use crate::record::Tracked;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Suffix appended to a type name to form its history table.
pub const HISTORY_TABLE_SUFFIX: &str = "_history";

const MAX_NAME_LEN: usize = 48;

/// Handle to a registered type, valid only for the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackedType {
    registry: u64,
    slot: usize,
}

/// A registered type: its normalized name and history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredType {
    name: String,
    table: String,
}

impl RegisteredType {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Collects registrations before the registry is frozen.
#[derive(Debug)]
pub struct RegistryBuilder {
    id: u64,
    types: Vec<RegisteredType>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            types: Vec::new(),
        }
    }

    /// Register a record type by name.
    ///
    /// The name is lower-cased; it must start with a letter or `_` and
    /// contain only ASCII letters, digits and `_`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTypeName` for unusable names and
    /// `CoreError::DuplicateType` if the normalized name is already taken.
    pub fn register(&mut self, name: &str) -> Result<TrackedType, CoreError> {
        let name = normalize_name(name)?;
        if self.types.iter().any(|t| t.name == name) {
            return Err(CoreError::DuplicateType { name });
        }

        let table = format!("{name}{HISTORY_TABLE_SUFFIX}");
        self.types.push(RegisteredType { name, table });
        Ok(TrackedType {
            registry: self.id,
            slot: self.types.len() - 1,
        })
    }

    /// Register a host type by its `Tracked::TYPE_NAME`.
    ///
    /// # Errors
    ///
    /// Same as [`RegistryBuilder::register`].
    pub fn track<T: Tracked>(&mut self) -> Result<TrackedType, CoreError> {
        self.register(T::TYPE_NAME)
    }

    /// Freeze the registrations.
    #[must_use]
    pub fn build(self) -> HistoryRegistry {
        HistoryRegistry {
            id: self.id,
            types: self.types,
        }
    }
}

/// Immutable table of tracked types.
#[derive(Debug)]
pub struct HistoryRegistry {
    id: u64,
    types: Vec<RegisteredType>,
}

impl HistoryRegistry {
    /// Resolve a handle issued by this registry.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnregisteredType` for handles from another registry.
    pub fn resolve(&self, ty: TrackedType) -> Result<&RegisteredType, CoreError> {
        if ty.registry != self.id {
            return Err(CoreError::UnregisteredType {
                name: format!("<handle #{} from another registry>", ty.slot),
            });
        }
        self.types
            .get(ty.slot)
            .ok_or_else(|| CoreError::UnregisteredType {
                name: format!("<handle #{}>", ty.slot),
            })
    }

    /// Find a type by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnregisteredType` if no type has that name.
    pub fn lookup(&self, name: &str) -> Result<TrackedType, CoreError> {
        let wanted = name.trim().to_ascii_lowercase();
        self.types
            .iter()
            .position(|t| t.name == wanted)
            .map(|slot| TrackedType {
                registry: self.id,
                slot,
            })
            .ok_or_else(|| CoreError::UnregisteredType {
                name: name.to_string(),
            })
    }

    /// Find a host type by its `Tracked::TYPE_NAME`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnregisteredType` if `T` was never registered.
    pub fn lookup_type<T: Tracked>(&self) -> Result<TrackedType, CoreError> {
        self.lookup(T::TYPE_NAME)
    }

    /// All registrations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (TrackedType, &RegisteredType)> {
        self.types.iter().enumerate().map(|(slot, t)| {
            (
                TrackedType {
                    registry: self.id,
                    slot,
                },
                t,
            )
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn normalize_name(name: &str) -> Result<String, CoreError> {
    let normalized = name.trim().to_ascii_lowercase();
    let invalid = |reason: &str| CoreError::InvalidTypeName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let Some(first) = normalized.chars().next() else {
        return Err(invalid("name is empty"));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(invalid("must start with a letter or '_'"));
    }
    if !normalized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid("only ASCII letters, digits and '_' are allowed"));
    }
    if normalized.len() > MAX_NAME_LEN {
        return Err(invalid("name is too long"));
    }
    Ok(normalized)
}
