//! Cross-cutting error types for Retrace.
//!
//! Storage errors (`DatabaseError`) and configuration errors (`ConfigError`)
//! live in their own crates and wrap `CoreError` where needed.

use thiserror::Error;

/// Errors raised by the pure record, diff, hydrate and registry logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// History access was requested for a type that was never registered.
    #[error("Record type '{name}' is not registered for history tracking")]
    UnregisteredType { name: String },

    /// The same record type was registered twice.
    #[error("Record type '{name}' is already registered")]
    DuplicateType { name: String },

    /// A record type name cannot be used as a storage identifier.
    #[error("Invalid record type name '{name}': {reason}")]
    InvalidTypeName { name: String, reason: String },

    /// A record has no usable `id` field.
    #[error("Record has no usable 'id' field")]
    MissingId,

    /// A value could not be interpreted as a tracked record.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// An update carried no incoming data and the policy rejects it.
    #[error("Update of record {origin} carries no incoming data")]
    EmptyIncoming { origin: String },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
