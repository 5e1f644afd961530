//! Database location.

use serde::{Deserialize, Serialize};

/// Default database file, relative to the project root.
pub const DEFAULT_DATABASE_PATH: &str = ".retrace/history.db";

fn default_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    /// Whether the database lives only in memory.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}
