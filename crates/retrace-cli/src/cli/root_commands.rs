use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// List tracked types and their history tables.
    Types,
    /// Print the structural diff between two record files.
    Diff(DiffArgs),
    /// Record one update of a tracked record.
    Record(RecordArgs),
    /// List history entries of one record, oldest first.
    History(HistoryArgs),
    /// Reconstruct past snapshots of a record.
    Hydrate(HydrateArgs),
    /// Write every history entry of a type as JSON lines.
    Export(ExportArgs),
}

/// Arguments for `retrace diff`.
#[derive(Clone, Debug, Args)]
pub struct DiffArgs {
    /// JSON file with the state before the update.
    #[arg(long)]
    pub previous: PathBuf,
    /// JSON file with the state supplied for the update.
    #[arg(long)]
    pub incoming: PathBuf,
}

/// Arguments for `retrace record`.
#[derive(Clone, Debug, Args)]
pub struct RecordArgs {
    /// Tracked type name.
    #[arg(value_name = "TYPE")]
    pub type_name: String,
    /// JSON file with the state before the update.
    #[arg(long)]
    pub previous: PathBuf,
    /// JSON file with the incoming state. Omit to record an update without payload.
    #[arg(long)]
    pub incoming: Option<PathBuf>,
    /// Annotation stored with the entry, as inline JSON.
    #[arg(long)]
    pub details: Option<String>,
}

/// Arguments for `retrace history`.
#[derive(Clone, Debug, Args)]
pub struct HistoryArgs {
    /// Tracked type name.
    #[arg(value_name = "TYPE")]
    pub type_name: String,
    /// Record id. Parsed as an integer when possible.
    pub origin: String,
}

/// Arguments for `retrace hydrate`.
#[derive(Clone, Debug, Args)]
pub struct HydrateArgs {
    /// Tracked type name.
    #[arg(value_name = "TYPE")]
    pub type_name: String,
    /// JSON file with the record state to replay history onto.
    #[arg(long)]
    pub current: PathBuf,
}

/// Arguments for `retrace export`.
#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    /// Tracked type name.
    #[arg(value_name = "TYPE")]
    pub type_name: String,
    /// Output JSONL file.
    #[arg(long)]
    pub out: PathBuf,
}
