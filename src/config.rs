use std::{
    fs::File,
    io::BufReader,
    path::{Component, Path, PathBuf},
    time::Duration,
};

use crate::foundation::error::{ThumbError, ThumbResult};

/// Extensions accepted when none are configured.
pub const DEFAULT_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "tif", "tiff"];

/// Quiescence window applied to change notifications before a file is converted.
pub const DEFAULT_DEBOUNCE_MS: u64 = 600;

/// Pixel dimensions of a thumbnail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Build a size from width and height.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Border stroke drawn along the rounded edge of each thumbnail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderSpec {
    /// Stroke width in pixels.
    pub width: f64,
    /// Straight (non-premultiplied) RGBA stroke colour.
    pub color: [u8; 4],
}

/// What happens to a source file after its thumbnail has been written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisposalPolicy {
    /// Remove the source file.
    Delete,
    /// Move the source file into `backup_dir` under its original name.
    Archive {
        /// Destination directory for retired originals.
        backup_dir: PathBuf,
    },
}

/// Immutable runtime configuration shared by every component.
///
/// Loaded from JSON (every field optional), overridden from the command line,
/// then checked once with [`Config::validate`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Drop folder, watched non-recursively.
    pub input_dir: PathBuf,
    /// Receives `<stem>.png` per converted source.
    pub output_dir: PathBuf,
    /// Thumbnail size.
    pub target: Size,
    /// Corner radius in output pixels.
    pub corner_radius: f64,
    /// Draw an outline along the rounded edge.
    pub add_border: bool,
    /// Outline width in output pixels.
    pub border_width: f64,
    /// Outline colour, straight RGBA.
    pub border_color: [u8; 4],
    /// Archive originals into `backup_dir` instead of deleting them.
    pub move_to_backup: bool,
    /// Destination for archived originals.
    pub backup_dir: PathBuf,
    /// Case-insensitive extension allow-list.
    pub valid_extensions: Vec<String>,
    /// Debounce window for change notifications, in milliseconds.
    pub debounce_ms: u64,
    /// Upper bound on conversions running at the same time.
    pub max_concurrent_jobs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input_images"),
            output_dir: PathBuf::from("output_images"),
            target: Size::new(1005, 1317),
            corner_radius: 80.0,
            add_border: false,
            border_width: 2.0,
            border_color: [0, 0, 0, 255],
            move_to_backup: false,
            backup_dir: PathBuf::from("originals_backup"),
            valid_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_concurrent_jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> ThumbResult<Self> {
        let f = File::open(path)
            .map_err(|e| ThumbError::config(format!("open '{}': {e}", path.display())))?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ThumbError::config(format!("parse '{}': {e}", path.display())))
    }

    /// Check invariants and normalize the extension list.
    pub fn validate(mut self) -> ThumbResult<Self> {
        if self.target.width == 0 || self.target.height == 0 {
            return Err(ThumbError::config("target width/height must be > 0"));
        }
        if !self.corner_radius.is_finite() || self.corner_radius < 0.0 {
            return Err(ThumbError::config("corner_radius must be finite and >= 0"));
        }
        if !self.border_width.is_finite() || self.border_width < 0.0 {
            return Err(ThumbError::config("border_width must be finite and >= 0"));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(ThumbError::config("max_concurrent_jobs must be > 0"));
        }

        let mut exts: Vec<String> = self
            .valid_extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        exts.sort();
        exts.dedup();
        if exts.is_empty() {
            return Err(ThumbError::config("valid_extensions must not be empty"));
        }
        self.valid_extensions = exts;

        if same_dir(&self.output_dir, &self.input_dir) {
            return Err(ThumbError::config(
                "output_dir must differ from input_dir (outputs would be re-converted)",
            ));
        }
        if self.move_to_backup && same_dir(&self.backup_dir, &self.input_dir) {
            return Err(ThumbError::config("backup_dir must differ from input_dir"));
        }
        Ok(self)
    }

    /// Create the input, output and (when archiving) backup directories.
    pub fn ensure_directories(&self) -> ThumbResult<()> {
        let mut dirs = vec![&self.input_dir, &self.output_dir];
        if self.move_to_backup {
            dirs.push(&self.backup_dir);
        }
        for dir in dirs {
            std::fs::create_dir_all(dir)
                .map_err(|e| ThumbError::config(format!("create '{}': {e}", dir.display())))?;
        }
        Ok(())
    }

    /// Disposal policy derived from `move_to_backup` / `backup_dir`.
    pub fn disposal_policy(&self) -> DisposalPolicy {
        if self.move_to_backup {
            DisposalPolicy::Archive {
                backup_dir: self.backup_dir.clone(),
            }
        } else {
            DisposalPolicy::Delete
        }
    }

    /// Border to draw, if any. A zero width disables the border.
    pub fn border(&self) -> Option<BorderSpec> {
        (self.add_border && self.border_width > 0.0).then_some(BorderSpec {
            width: self.border_width,
            color: self.border_color,
        })
    }

    /// Debounce window as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Case-insensitive check against the extension allow-list.
    pub fn accepts(&self, path: &Path) -> bool {
        has_allowed_extension(path, &self.valid_extensions)
    }
}

/// `true` when `path` has an extension in `exts` (compared case-insensitively).
pub fn has_allowed_extension(path: &Path, exts: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    exts.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext))
}

/// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional) into straight RGBA.
pub fn parse_rgba_hex(s: &str) -> ThumbResult<[u8; 4]> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
        return Err(ThumbError::config(format!(
            "colour '{s}' must be #RRGGBB or #RRGGBBAA"
        )));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| ThumbError::config(format!("colour '{s}' has non-hex digits")))
    };
    let a = if hex.len() == 8 { channel(3)? } else { 255 };
    Ok([channel(0)?, channel(1)?, channel(2)?, a])
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        // Directories are only created after validation; compare the paths lexically.
        _ => absolute_lexical(a) == absolute_lexical(b),
    }
}

/// `path` made absolute against the working directory, with `.` and `..` folded.
fn absolute_lexical(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    let mut out = PathBuf::new();
    for part in joined.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
