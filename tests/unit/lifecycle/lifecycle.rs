use image::Rgba;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "thumbwatch_{name}_{}_{}",
        std::process::id(),
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn tiny() -> RgbaImage {
    RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]))
}

#[test]
fn output_name_ignores_source_extension_and_case() {
    let out = Path::new("out");
    assert_eq!(
        output_path_for(Path::new("in/Photo.JPG"), out),
        Some(PathBuf::from("out/Photo.png"))
    );
    assert_eq!(
        output_path_for(Path::new("in/scan.tiff"), out),
        Some(PathBuf::from("out/scan.png"))
    );
    assert_eq!(
        output_path_for(Path::new("in/archive.tar.webp"), out),
        Some(PathBuf::from("out/archive.tar.png"))
    );
    assert_eq!(output_path_for(Path::new("/"), out), None);
}

#[test]
fn finalize_with_delete_policy_removes_source() {
    let tmp = temp_dir("finalize_delete");
    let src = tmp.join("a.jpg");
    std::fs::write(&src, b"original").unwrap();
    let out_dir = tmp.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();

    let job = ConversionJob::new(&src, &out_dir).unwrap();
    let disposal = finalize(&job, &tiny(), &DisposalPolicy::Delete).unwrap();

    assert!(matches!(disposal, Disposal::Deleted));
    assert!(!src.exists());
    let written = image::open(out_dir.join("a.png")).unwrap();
    assert_eq!((written.width(), written.height()), (3, 2));
    let leftovers = std::fs::read_dir(&out_dir)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".part"))
        .count();
    assert_eq!(leftovers, 0);
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn concurrent_writers_of_one_output_use_distinct_partial_files() {
    let out = Path::new("out").join("a.png");
    let first = partial_path(&out).unwrap();
    let second = partial_path(&out).unwrap();
    assert_ne!(first, second);
    for p in [&first, &second] {
        assert_eq!(p.parent(), out.parent());
        let name = p.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".a.png."), "{name}");
        assert!(name.ends_with(".part"), "{name}");
    }
}

#[test]
fn same_stem_sources_written_in_parallel_leave_a_valid_png() {
    let tmp = temp_dir("parallel_same_stem");
    std::fs::create_dir_all(&tmp).unwrap();
    let out = tmp.join("a.png");
    let big = RgbaImage::from_pixel(400, 300, Rgba([10, 20, 30, 255]));

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| write_png(&out, &big));
        }
    });

    let written = image::open(&out).unwrap();
    assert_eq!((written.width(), written.height()), (400, 300));
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn finalize_overwrites_existing_output() {
    let tmp = temp_dir("finalize_overwrite");
    let src = tmp.join("b.png");
    std::fs::write(&src, b"original").unwrap();
    std::fs::write(tmp.join("b_out.png"), b"stale").unwrap();

    let job = ConversionJob {
        source: src.clone(),
        output: tmp.join("b_out.png"),
    };
    finalize(&job, &tiny(), &DisposalPolicy::Delete).unwrap();
    assert!(image::open(tmp.join("b_out.png")).is_ok());
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn failed_write_leaves_source_untouched() {
    let tmp = temp_dir("finalize_write_fail");
    let src = tmp.join("c.jpg");
    std::fs::write(&src, b"original").unwrap();

    let job = ConversionJob::new(&src, &tmp.join("does_not_exist")).unwrap();
    let err = finalize(&job, &tiny(), &DisposalPolicy::Delete).unwrap_err();

    assert!(matches!(err, ThumbError::Encode(_)));
    assert_eq!(std::fs::read(&src).unwrap(), b"original");
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn archive_moves_under_original_name() {
    let tmp = temp_dir("archive_plain");
    let backup = tmp.join("backup");
    std::fs::create_dir_all(&backup).unwrap();
    let src = tmp.join("photo.jpg");
    std::fs::write(&src, b"new").unwrap();

    let policy = DisposalPolicy::Archive {
        backup_dir: backup.clone(),
    };
    let Disposal::Archived(dest) = dispose(&src, &policy) else {
        panic!("expected archive");
    };
    assert_eq!(dest, backup.join("photo.jpg"));
    assert!(!src.exists());
    assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn archive_collision_appends_unix_time() {
    let tmp = temp_dir("archive_collision");
    let backup = tmp.join("backup");
    std::fs::create_dir_all(&backup).unwrap();
    std::fs::write(backup.join("photo.jpg"), b"first").unwrap();
    let src = tmp.join("photo.jpg");
    std::fs::write(&src, b"second").unwrap();

    let dest = archive(&src, &backup, 1_700_000_000).unwrap();
    assert_eq!(dest, backup.join("photo_1700000000.jpg"));
    assert_eq!(std::fs::read(backup.join("photo.jpg")).unwrap(), b"first");
    assert_eq!(std::fs::read(&dest).unwrap(), b"second");
    assert!(!src.exists());

    std::fs::write(&src, b"third").unwrap();
    let again = archive(&src, &backup, 1_700_000_000).unwrap();
    assert_eq!(again, backup.join("photo_1700000000_1.jpg"));
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn archive_collision_with_real_clock_uses_timestamp_suffix() {
    let tmp = temp_dir("archive_clock");
    let backup = tmp.join("backup");
    std::fs::create_dir_all(&backup).unwrap();
    std::fs::write(backup.join("photo.jpg"), b"first").unwrap();
    let src = tmp.join("photo.jpg");
    std::fs::write(&src, b"second").unwrap();

    let policy = DisposalPolicy::Archive {
        backup_dir: backup.clone(),
    };
    let Disposal::Archived(dest) = dispose(&src, &policy) else {
        panic!("expected archive");
    };
    let name = dest.file_name().unwrap().to_str().unwrap().to_string();
    let stamp = name
        .strip_prefix("photo_")
        .and_then(|s| s.strip_suffix(".jpg"))
        .unwrap();
    assert!(stamp.parse::<u64>().unwrap() > 1_600_000_000);
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn archive_destination_without_extension() {
    let tmp = temp_dir("archive_noext");
    std::fs::write(tmp.join("README"), b"x").unwrap();
    let dest = archive_destination(Path::new("in/README"), &tmp, 42).unwrap();
    assert_eq!(dest, tmp.join("README_42"));
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn delete_failure_is_reported_not_raised() {
    let tmp = temp_dir("delete_missing");
    let disposal = dispose(&tmp.join("gone.jpg"), &DisposalPolicy::Delete);
    assert!(matches!(disposal, Disposal::Failed(ThumbError::Disposal(_))));
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn archive_into_missing_dir_is_a_disposal_failure() {
    let tmp = temp_dir("archive_missing_dir");
    let src = tmp.join("d.jpg");
    std::fs::write(&src, b"keep").unwrap();
    let policy = DisposalPolicy::Archive {
        backup_dir: tmp.join("nope"),
    };
    assert!(matches!(dispose(&src, &policy), Disposal::Failed(_)));
    assert!(src.exists());
    std::fs::remove_dir_all(&tmp).ok();
}
