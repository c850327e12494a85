use std::path::Path;

use anyhow::Context;
use revops_data::DashboardPayload;

/// Write `payload` as pretty JSON to `path`.
///
/// The document goes to a sibling temp file first and is renamed into place,
/// so readers never observe a half-written payload.
pub fn write_payload(path: &Path, payload: &DashboardPayload) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(payload).context("serializing dashboard payload")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    std::fs::write(tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(tmp, path).with_context(|| format!("renaming onto {}", path.display()))?;
    Ok(())
}
