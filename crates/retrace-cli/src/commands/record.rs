use retrace_core::Record;
use retrace_db::UpdateEvent;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RecordArgs;
use crate::commands::shared::input::{parse_details, read_record};
use crate::context::AppContext;
use crate::output::output;

/// Handle `retrace record`.
///
/// Prints the stored entry, or `null` when the update changed nothing.
pub async fn handle(args: &RecordArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let ty = ctx.tracked_type(&args.type_name)?;
    let previous = read_record(&args.previous)?;
    let incoming: Option<Record> = args.incoming.as_deref().map(read_record).transpose()?;
    let details = parse_details(args.details.as_deref())?;

    let event = UpdateEvent {
        previous: &previous,
        incoming: incoming.as_ref(),
        details: details.as_ref(),
    };
    let entry = ctx.service.record_update(ty, &event).await?;
    output(&entry, flags.format)
}
