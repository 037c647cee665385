use std::path::Path;

use editor_assist::editor::file_store::{language_for_path, load, save, sha256_hex};
use editor_assist::AppError;

#[test]
fn load_records_content_and_digest() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("main.rs");
    std::fs::write(&path, "fn main() {}\n").expect("seed file");

    let loaded = load(&path).expect("load succeeds");

    assert_eq!(loaded.content, "fn main() {}\n");
    assert_eq!(loaded.original_hash, sha256_hex(b"fn main() {}\n"));
    assert_eq!(loaded.path, path);
}

#[test]
fn load_rejects_non_utf8() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("blob.bin");
    std::fs::write(&path, [0xff, 0xfe, 0x00]).expect("seed file");

    let err = load(&path).expect_err("binary file must fail");

    assert!(matches!(err, AppError::Io(ref msg) if msg.contains("not valid utf-8")));
}

#[test]
fn save_overwrites_unchanged_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("lib.rs");
    std::fs::write(&path, "old\n").expect("seed file");
    let loaded = load(&path).expect("load");

    let summary = save(&loaded, "new\n", false).expect("save succeeds");

    assert_eq!(summary.bytes_written, 4);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
}

#[test]
fn save_refuses_when_file_changed_on_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("lib.rs");
    std::fs::write(&path, "old\n").expect("seed file");
    let loaded = load(&path).expect("load");
    std::fs::write(&path, "edited elsewhere\n").expect("external edit");

    let err = save(&loaded, "new\n", false).expect_err("conflict must fail");

    assert!(matches!(err, AppError::ApplyPrecondition(ref msg) if msg.contains("changed on disk")));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "edited elsewhere\n",
        "the external edit must survive"
    );
}

#[test]
fn save_with_force_overwrites_changed_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("lib.rs");
    std::fs::write(&path, "old\n").expect("seed file");
    let loaded = load(&path).expect("load");
    std::fs::write(&path, "edited elsewhere\n").expect("external edit");

    save(&loaded, "new\n", true).expect("forced save succeeds");

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
}

#[test]
fn save_refuses_when_file_was_deleted() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("gone.rs");
    std::fs::write(&path, "x").expect("seed file");
    let loaded = load(&path).expect("load");
    std::fs::remove_file(&path).expect("delete");

    let err = save(&loaded, "y", false).expect_err("missing file must fail");

    assert!(matches!(err, AppError::ApplyPrecondition(ref msg) if msg.contains("no longer exists")));
    assert!(!path.exists());
}

#[test]
fn language_follows_extension() {
    assert_eq!(language_for_path(Path::new("src/main.rs")), "rust");
    assert_eq!(language_for_path(Path::new("a/b.PY")), "python");
    assert_eq!(language_for_path(Path::new("x.hpp")), "cpp");
    assert_eq!(language_for_path(Path::new("init.el")), "elisp");
    assert_eq!(language_for_path(Path::new("Makefile")), "text");
}

#[test]
fn digest_is_lowercase_hex() {
    assert_eq!(
        sha256_hex(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}
