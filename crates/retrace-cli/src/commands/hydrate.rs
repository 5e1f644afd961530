use crate::cli::GlobalFlags;
use crate::cli::root_commands::HydrateArgs;
use crate::commands::shared::input::read_record;
use crate::context::AppContext;
use crate::output::output;

/// Handle `retrace hydrate`.
///
/// Replays the full history of the record in `--current`; `--limit` does not
/// apply because the fold needs every entry.
pub async fn handle(
    args: &HydrateArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let ty = ctx.tracked_type(&args.type_name)?;
    let current = read_record(&args.current)?;
    let snapshots = ctx.service.hydrate(ty, &current).await?;
    output(&snapshots, flags.format)
}
