use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct TypeRow<'a> {
    name: &'a str,
    table: &'a str,
}

/// Handle `retrace types`.
pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let rows = ctx
        .service
        .registry()
        .iter()
        .map(|(_, registered)| TypeRow {
            name: registered.name(),
            table: registered.table(),
        })
        .collect::<Vec<_>>();
    tracing::debug!(db = %ctx.db_path, types = rows.len(), "listing tracked types");
    output(&rows, flags.format)
}
