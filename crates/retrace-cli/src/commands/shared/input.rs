use std::path::Path;

use anyhow::Context;
use retrace_core::Record;
use retrace_core::record::value_to_record;

/// Read a JSON object from a file.
pub fn read_record(path: &Path) -> anyhow::Result<Record> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    value_to_record(value).with_context(|| format!("{} must hold a JSON object", path.display()))
}

/// Parse an inline JSON annotation. `null` counts as no annotation.
pub fn parse_details(raw: Option<&str>) -> anyhow::Result<Option<serde_json::Value>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("invalid --details JSON '{raw}'"))?;
    Ok((!value.is_null()).then_some(value))
}
