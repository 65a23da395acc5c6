//! Atomic file write using the write-rename pattern.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Writes `data` to `path` via a `{path}.tmp` sibling, syncing before the
/// rename so a crash mid-write leaves the previous save untouched.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
