//! Portable `cp` / `mkdir` for build scripts.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use doctools_shared::{DocToolsError, Result};

/// Copy `src` to `dest`. An existing directory `dest` receives the file
/// under its original name. Returns the path written.
#[instrument(skip_all, fields(src = %src.display(), dest = %dest.display()))]
pub fn copy_file(src: &Path, dest: &Path) -> Result<PathBuf> {
    let target = if dest.is_dir() {
        let name = src.file_name().ok_or_else(|| {
            DocToolsError::validation(format!("source has no file name: {}", src.display()))
        })?;
        dest.join(name)
    } else {
        dest.to_path_buf()
    };

    let bytes = std::fs::copy(src, &target).map_err(|e| DocToolsError::io(src, e))?;
    debug!(target = %target.display(), bytes, "file copied");

    Ok(target)
}

/// Create `path` unless it already exists. Parents must exist.
/// Returns whether the directory was created.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn make_dir(path: &Path) -> Result<bool> {
    if path.exists() {
        debug!("already exists");
        return Ok(false);
    }

    std::fs::create_dir(path).map_err(|e| DocToolsError::io(path, e))?;
    debug!("directory created");
    Ok(true)
}
