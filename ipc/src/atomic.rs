//! Atomic JSON state-file I/O: every producer writes via temp-file-plus-rename
//! so a concurrent reader only ever sees a complete, valid file.

use crate::error::IpcError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Serializes `value` to `dir/filename`, writing to a sibling temp file in
/// the same directory first, fsyncing it, then renaming into place. The
/// rename is atomic on the same filesystem, so readers never observe a
/// partially-written file.
pub fn atomic_write_json<T: Serialize>(
    dir: &Path,
    filename: &str,
    value: &T,
) -> Result<PathBuf, IpcError> {
    std::fs::create_dir_all(dir).map_err(|e| IpcError::io(dir, e))?;
    let final_path = dir.join(filename);

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| IpcError::io(dir, e))?;
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| IpcError::SchemaInvalid { path: final_path.clone(), source: e })?;
    tmp.write_all(&bytes).map_err(|e| IpcError::io(&final_path, e))?;
    tmp.as_file().sync_all().map_err(|e| IpcError::io(&final_path, e))?;
    tmp.persist(&final_path)
        .map_err(|e| IpcError::io(&final_path, e.error))?;

    Ok(final_path)
}

/// Reads and parses a JSON state file, distinguishing an I/O failure from a
/// schema failure so callers can apply §7's distinct policies for each.
pub fn read_json_tolerant<T: DeserializeOwned>(path: &Path) -> Result<T, IpcError> {
    let bytes = std::fs::read(path).map_err(|e| IpcError::io(path, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| IpcError::SchemaInvalid { path: path.to_path_buf(), source: e })
}

/// Unlinks a state file, tolerating a concurrent unlink by another consumer.
pub fn unlink_tolerant(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to unlink state file");
        }
    }
}
