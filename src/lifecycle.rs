use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use image::RgbaImage;

use crate::{
    config::DisposalPolicy,
    foundation::error::{ThumbError, ThumbResult},
};

/// Extension of every produced thumbnail.
pub const OUTPUT_EXTENSION: &str = "png";

static PART_SEQ: AtomicU64 = AtomicU64::new(0);

/// One conversion attempt for one source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionJob {
    /// File being converted.
    pub source: PathBuf,
    /// `<output_dir>/<stem>.png`.
    pub output: PathBuf,
}

impl ConversionJob {
    /// Derive the output path for `source` inside `output_dir`.
    pub fn new(source: impl Into<PathBuf>, output_dir: &Path) -> ThumbResult<Self> {
        let source = source.into();
        let output = output_path_for(&source, output_dir).ok_or_else(|| {
            ThumbError::decode(format!("'{}' has no file name", source.display()))
        })?;
        Ok(Self { source, output })
    }
}

/// How the original was retired after its thumbnail was written.
#[derive(Debug)]
pub enum Disposal {
    /// Source removed.
    Deleted,
    /// Source moved to this path.
    Archived(PathBuf),
    /// Removing or moving the source failed; the thumbnail is kept.
    Failed(ThumbError),
}

/// `<output_dir>/<stem>.png`, independent of the source extension or its case.
pub fn output_path_for(source: &Path, output_dir: &Path) -> Option<PathBuf> {
    let stem = source.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    Some(output_dir.join(name))
}

/// Write the thumbnail, then retire the source according to `policy`.
///
/// Returns `Err` only when the thumbnail could not be written, in which case the
/// source is left untouched. Disposal problems come back as [`Disposal::Failed`].
pub fn finalize(
    job: &ConversionJob,
    output: &RgbaImage,
    policy: &DisposalPolicy,
) -> ThumbResult<Disposal> {
    write_png(&job.output, output)?;
    Ok(dispose(&job.source, policy))
}

/// Encode `img` as PNG at `path`, replacing any existing file.
///
/// The image is written to a hidden sibling first and renamed into place, so a
/// reader never sees a half-written thumbnail.
pub fn write_png(path: &Path, img: &RgbaImage) -> ThumbResult<()> {
    let tmp = partial_path(path)?;
    let written = img
        .save_with_format(&tmp, image::ImageFormat::Png)
        .map_err(|e| ThumbError::encode(format!("write '{}': {e}", tmp.display())))
        .and_then(|()| {
            std::fs::rename(&tmp, path).map_err(|e| {
                ThumbError::encode(format!(
                    "rename '{}' -> '{}': {e}",
                    tmp.display(),
                    path.display()
                ))
            })
        });
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written
}

/// Delete or archive `source`.
pub fn dispose(source: &Path, policy: &DisposalPolicy) -> Disposal {
    match policy {
        DisposalPolicy::Delete => match std::fs::remove_file(source) {
            Ok(()) => Disposal::Deleted,
            Err(e) => Disposal::Failed(ThumbError::disposal(format!(
                "delete '{}': {e}",
                source.display()
            ))),
        },
        DisposalPolicy::Archive { backup_dir } => {
            match archive(source, backup_dir, unix_now()) {
                Ok(dest) => Disposal::Archived(dest),
                Err(e) => Disposal::Failed(e),
            }
        }
    }
}

/// Move `source` into `backup_dir`, returning where it ended up.
pub fn archive(source: &Path, backup_dir: &Path, now_unix: u64) -> ThumbResult<PathBuf> {
    let dest = archive_destination(source, backup_dir, now_unix)?;
    move_file(source, &dest).map_err(|e| {
        ThumbError::disposal(format!(
            "move '{}' -> '{}': {e}",
            source.display(),
            dest.display()
        ))
    })?;
    Ok(dest)
}

/// Free destination for `source` in `backup_dir`.
///
/// The original name when free, else `<stem>_<now_unix><.ext>`, else
/// `<stem>_<now_unix>_<n><.ext>` for the first free `n`.
pub fn archive_destination(
    source: &Path,
    backup_dir: &Path,
    now_unix: u64,
) -> ThumbResult<PathBuf> {
    let name = source.file_name().ok_or_else(|| {
        ThumbError::disposal(format!("'{}' has no file name", source.display()))
    })?;
    let dest = backup_dir.join(name);
    if !exists(&dest) {
        return Ok(dest);
    }

    let stem = source.file_stem().unwrap_or(name);
    let ext = source.extension();
    let suffixed = |suffix: String| {
        let mut n = OsString::from(stem);
        n.push(suffix);
        if let Some(ext) = ext {
            n.push(".");
            n.push(ext);
        }
        backup_dir.join(n)
    };

    let stamped = suffixed(format!("_{now_unix}"));
    if !exists(&stamped) {
        return Ok(stamped);
    }
    (1u32..)
        .map(|i| suffixed(format!("_{now_unix}_{i}")))
        .find(|p| !exists(p))
        .ok_or_else(|| ThumbError::disposal("no free archive name"))
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        // Different filesystem: fall back to copy + remove.
        Err(_) if from.is_file() => {
            std::fs::copy(from, to)?;
            if let Err(e) = std::fs::remove_file(from) {
                let _ = std::fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn partial_path(path: &Path) -> ThumbResult<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| ThumbError::encode(format!("'{}' has no file name", path.display())))?;
    // Unique per writer: sources sharing a stem map to the same output.
    let seq = PART_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut tmp = OsString::from(".");
    tmp.push(name);
    tmp.push(format!(".{}.{seq}.part", std::process::id()));
    Ok(path.with_file_name(tmp))
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../tests/unit/lifecycle/lifecycle.rs"]
mod tests;
