use retrace_core::RecordId;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::HistoryArgs;
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

/// Handle `retrace history`.
pub async fn handle(
    args: &HistoryArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let repo = ctx.repo(&args.type_name)?;
    let origin = RecordId::from_arg(&args.origin);
    let limit = effective_limit(flags.limit, ctx.config.history.default_limit);

    let entries = repo.list_for_origin_limited(&origin, limit).await?;
    output(&entries, flags.format)
}
