use std::path::{Path, PathBuf};

use crate::{
    config::has_allowed_extension,
    foundation::error::{ThumbError, ThumbResult},
};

/// Regular files directly inside `dir` whose extension is in `exts`, sorted by path.
///
/// Subdirectories are not descended into.
pub fn list_eligible(dir: &Path, exts: &[String]) -> ThumbResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| ThumbError::config(format!("read '{}': {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| ThumbError::config(format!("read '{}': {e}", dir.display())))?;
        let path = entry.path();
        if path.is_file() && has_allowed_extension(&path, exts) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
#[path = "../tests/unit/scan/scan.rs"]
mod tests;
