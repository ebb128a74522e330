use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, WaypointError};

/// Replaces `path` with `bytes` via a sibling temp file and a rename, so a
/// failed write never leaves a truncated file behind.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| WaypointError::io(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| WaypointError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| WaypointError::io(path, e.error))?;
    Ok(())
}
