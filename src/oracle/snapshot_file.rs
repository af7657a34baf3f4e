//! Snapshot file for out-of-process readers
//!
//! Written with write-to-temp-then-rename so a reader never observes a
//! half-written file.

use super::types::{OracleSnapshot, SnapshotFileError};
use std::path::{Path, PathBuf};

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically replace `path` with the JSON form of `snapshot`
pub async fn write_snapshot_file(
    path: &Path,
    snapshot: &OracleSnapshot,
) -> Result<(), SnapshotFileError> {
    let json = serde_json::to_vec_pretty(snapshot)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Read a snapshot previously written by [`write_snapshot_file`]
pub async fn read_snapshot_file(path: &Path) -> Result<OracleSnapshot, SnapshotFileError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
