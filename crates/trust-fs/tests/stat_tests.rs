use assert_fs::prelude::*;
use pretty_assertions::assert_eq;
use std::fs::File;
use std::time::{Duration, SystemTime};
use trust_fs::{FileStat, NormalizedPath, stat};

fn stat_of(child: &assert_fs::fixture::ChildPath) -> FileStat {
    stat(&NormalizedPath::new(child.path())).unwrap()
}

#[test]
fn test_unchanged_file_stats_equal() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("ca.pem");
    file.write_str("certificate").unwrap();

    assert_eq!(stat_of(&file), stat_of(&file));
}

#[test]
fn test_size_change_is_visible() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("ca.pem");
    file.write_str("short").unwrap();
    let before = stat_of(&file);

    file.write_str("a good deal longer").unwrap();
    let after = stat_of(&file);

    assert_ne!(before, after);
    assert_eq!(after.size, 18);
}

#[test]
fn test_mtime_change_is_visible() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("ca.pem");
    file.write_str("certificate").unwrap();
    let before = stat_of(&file);

    let later = SystemTime::now() + Duration::from_secs(60);
    File::options()
        .write(true)
        .open(file.path())
        .unwrap()
        .set_modified(later)
        .unwrap();
    let after = stat_of(&file);

    assert_eq!(before.size, after.size);
    assert_ne!(before.modified, after.modified);
    assert_ne!(before, after);
}

#[cfg(unix)]
#[test]
fn test_mode_change_is_visible() {
    use std::os::unix::fs::PermissionsExt;

    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("ca.pem");
    file.write_str("certificate").unwrap();
    std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o644)).unwrap();
    let before = stat_of(&file);

    std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600)).unwrap();
    let after = stat_of(&file);

    assert_ne!(before.mode, after.mode);
    assert_ne!(before, after);
}

#[test]
fn test_directory_is_reported_as_directory() {
    let temp = assert_fs::TempDir::new().unwrap();
    let dir = temp.child("anchors");
    dir.create_dir_all().unwrap();

    assert!(stat_of(&dir).is_dir());
}

#[test]
fn test_missing_path_error_names_path() {
    let temp = assert_fs::TempDir::new().unwrap();
    let missing = NormalizedPath::new(temp.path().join("gone.pem"));

    let err = stat(&missing).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("gone.pem"));
}
