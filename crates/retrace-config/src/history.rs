//! History recording settings.

use retrace_core::EmptyIncomingPolicy;
use serde::{Deserialize, Serialize};

/// Default result limit for list commands.
const fn default_limit() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Record type names registered for tracking at startup.
    #[serde(default)]
    pub tracked_types: Vec<String>,

    /// How updates without an incoming payload are handled.
    #[serde(default)]
    pub empty_incoming: EmptyIncomingPolicy,

    /// Default result limit for list commands.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            tracked_types: Vec::new(),
            empty_incoming: EmptyIncomingPolicy::default(),
            default_limit: default_limit(),
        }
    }
}
