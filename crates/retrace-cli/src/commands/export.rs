use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ExportResponse {
    r#type: String,
    path: String,
    entries: usize,
}

/// Handle `retrace export`.
pub async fn handle(args: &ExportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let ty = ctx.tracked_type(&args.type_name)?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let entries = ctx.service.export_jsonl(ty, &args.out).await?;
    output(
        &ExportResponse {
            r#type: ctx.service.resolve(ty)?.name().to_string(),
            path: args.out.display().to_string(),
            entries,
        },
        flags.format,
    )
}
