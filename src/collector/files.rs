use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::FileRecord;

/// Stat one watched path. Anything unstatable (missing, unreadable) is
/// absence, not an error.
pub fn stat(path: &Path) -> Option<FileRecord> {
    let metadata = std::fs::metadata(path).ok()?;
    let modified_at = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();

    Some(FileRecord {
        path: path.display().to_string(),
        size_bytes: metadata.len(),
        modified_at,
    })
}
