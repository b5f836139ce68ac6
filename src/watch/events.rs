use std::path::{Path, PathBuf};

use notify::{
    Event, EventKind,
    event::{AccessKind, AccessMode, CreateKind, MetadataKind, ModifyKind, RenameMode},
};

use crate::config::has_allowed_extension;

/// Paths an event reports as newly written or moved into the directory.
///
/// Creations, content or metadata changes, close-after-write and the
/// destination side of renames count. Removals, renames away, access-time
/// updates and folder creation do not.
pub fn arrivals(event: &Event) -> &[PathBuf] {
    let none: &[PathBuf] = &[];
    match event.kind {
        EventKind::Create(CreateKind::Folder) => none,
        EventKind::Create(_) => event.paths.as_slice(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => none,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.get(1..2).unwrap_or(none)
        }
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => none,
        EventKind::Modify(_) => event.paths.as_slice(),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => event.paths.as_slice(),
        EventKind::Access(_) | EventKind::Remove(_) | EventKind::Any | EventKind::Other => none,
    }
}

/// [`arrivals`] that are not directories and carry an allowed extension.
pub fn eligible_arrivals(event: &Event, exts: &[String]) -> Vec<PathBuf> {
    arrivals(event)
        .iter()
        .filter(|p| has_allowed_extension(p, exts) && !p.is_dir())
        .cloned()
        .collect()
}

/// `true` for events after which the watched directory itself may be gone.
pub fn may_signal_loss(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}

/// `true` when `dir` still exists as a directory.
pub fn dir_present(dir: &Path) -> bool {
    dir.is_dir()
}

#[cfg(test)]
#[path = "../../tests/unit/watch/events.rs"]
mod tests;
