use crate::cli::GlobalFlags;
use crate::cli::root_commands::DiffArgs;
use crate::commands::shared::input::read_record;
use crate::output::output;

/// Handle `retrace diff`.
///
/// Prints the changed fields, `{}` when the two states are equal.
pub fn handle(args: &DiffArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let previous = read_record(&args.previous)?;
    let incoming = read_record(&args.incoming)?;
    let changes = retrace_core::diff(&previous, &incoming);
    output(&changes, flags.format)
}
