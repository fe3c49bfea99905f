//! Shared utilities for `sidecar`.
//!
//! - Time parsing and formatting (ISO-8601, overlay timestamps)
//! - Atomic whole-file writes
//! - Home directory expansion

pub mod time;

use crate::error::{Result, SidecarError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Replace `path` with `contents` via a sibling temp file and a rename.
///
/// Readers see either the old file or the new one, never a partial write.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the temp
/// file cannot be written, or the rename fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SidecarError::path_io(parent, e))?;
    }

    let mut temp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let write_temp = || -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()
    };
    if let Err(e) = write_temp() {
        let _ = fs::remove_file(&temp_path);
        return Err(SidecarError::path_io(&temp_path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        SidecarError::path_io(path, e)
    })
}

/// Expand a leading `~` to `$HOME`.
#[must_use]
pub fn expand_home(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME") {
            let rest = rest.trim_start_matches(['/', '\\']);
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(trimmed)
}
