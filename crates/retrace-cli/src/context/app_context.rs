use std::path::Path;

use anyhow::Context;
use retrace_config::RetraceConfig;
use retrace_core::{RegistryBuilder, TrackedType};
use retrace_db::{HistoryRepo, HistoryService};

use crate::cli::GlobalFlags;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: HistoryService,
    pub config: RetraceConfig,
    pub db_path: String,
}

impl AppContext {
    /// Register the configured types and open the history database.
    ///
    /// `--db` takes precedence over `database.path`. The parent directory of
    /// a file database is created if missing.
    pub async fn init(mut config: RetraceConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        if let Some(path) = &flags.db {
            config.database.path.clone_from(path);
        }
        config.validate()?;
        let db_path = config.database.path.clone();

        if !config.database.is_in_memory() {
            if let Some(parent) = Path::new(&db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create database directory {}", parent.display())
                    })?;
                }
            }
        }

        let mut builder = RegistryBuilder::new();
        for name in &config.history.tracked_types {
            builder
                .register(name)
                .with_context(|| format!("invalid tracked type '{name}' in config"))?;
        }
        let registry = builder.build();
        if registry.is_empty() {
            tracing::warn!("no tracked types configured; set history.tracked_types");
        }

        let service =
            HistoryService::open_local(&db_path, registry, config.history.empty_incoming)
                .await
                .with_context(|| format!("failed to open history database at {db_path}"))?;

        Ok(Self {
            service,
            config,
            db_path,
        })
    }

    /// Resolve a type name given on the command line.
    pub fn tracked_type(&self, name: &str) -> anyhow::Result<TrackedType> {
        self.service
            .registry()
            .lookup(name)
            .with_context(|| format!("'{name}' is not a tracked type"))
    }

    /// History repository for a type name given on the command line.
    pub fn repo(&self, name: &str) -> anyhow::Result<HistoryRepo<'_>> {
        let ty = self.tracked_type(name)?;
        Ok(self.service.history(ty)?)
    }
}
