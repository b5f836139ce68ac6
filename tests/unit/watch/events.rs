use notify::event::{DataChange, MetadataKind, RemoveKind};

use super::*;

fn exts() -> Vec<String> {
    vec!["jpg".into(), "png".into()]
}

fn event(kind: EventKind, paths: &[&str]) -> Event {
    paths
        .iter()
        .fold(Event::new(kind), |ev, p| ev.add_path(PathBuf::from(p)))
}

#[test]
fn creations_and_writes_are_arrivals() {
    for kind in [
        EventKind::Create(CreateKind::File),
        EventKind::Create(CreateKind::Any),
        EventKind::Modify(ModifyKind::Data(DataChange::Content)),
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
        EventKind::Modify(ModifyKind::Any),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)),
        EventKind::Access(AccessKind::Close(AccessMode::Write)),
    ] {
        let ev = event(kind, &["drop/a.jpg"]);
        assert_eq!(eligible_arrivals(&ev, &exts()), vec![PathBuf::from("drop/a.jpg")], "{kind:?}");
    }
}

#[test]
fn removals_and_renames_away_are_ignored() {
    for kind in [
        EventKind::Remove(RemoveKind::File),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)),
        EventKind::Access(AccessKind::Read),
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)),
        EventKind::Create(CreateKind::Folder),
        EventKind::Any,
    ] {
        let ev = event(kind, &["drop/a.jpg"]);
        assert!(eligible_arrivals(&ev, &exts()).is_empty(), "{kind:?}");
    }
}

#[test]
fn rename_both_uses_destination() {
    let ev = event(
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
        &["drop/tmp.part", "drop/final.PNG"],
    );
    assert_eq!(eligible_arrivals(&ev, &exts()), vec![PathBuf::from("drop/final.PNG")]);

    let away = event(
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
        &["drop/a.jpg", "drop/a.txt"],
    );
    assert!(eligible_arrivals(&away, &exts()).is_empty());
}

#[test]
fn other_extensions_are_ignored() {
    let ev = event(EventKind::Create(CreateKind::File), &["drop/notes.txt", "drop/b.jpg"]);
    assert_eq!(eligible_arrivals(&ev, &exts()), vec![PathBuf::from("drop/b.jpg")]);
}

#[test]
fn loss_candidates() {
    assert!(may_signal_loss(&event(EventKind::Remove(RemoveKind::Folder), &["drop"])));
    assert!(may_signal_loss(&event(
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
        &["drop"]
    )));
    assert!(!may_signal_loss(&event(EventKind::Create(CreateKind::File), &["drop/a.jpg"])));
    assert!(dir_present(&std::env::temp_dir()));
    assert!(!dir_present(Path::new("/definitely/not/a/thumbwatch/dir")));
}
