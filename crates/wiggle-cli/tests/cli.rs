//! End-to-end driver tests over the compiled `wiggle` binary: real files on
//! disk, real argv, real exit codes (SPEC_FULL.md §8.1, §11).

use std::io::Write as _;
use std::process::Command;

fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents).unwrap();
    path
}

#[test]
fn patch_mode_applies_cleanly_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let original = write_temp(&dir, "original.txt", b"a\nb\nc\n");
    let patch = write_temp(&dir, "change.patch", b"@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n");

    let output = Command::new(env!("CARGO_BIN_EXE_wiggle"))
        .args(["patch", original.to_str().unwrap(), patch.to_str().unwrap()])
        .output()
        .expect("failed to run wiggle binary");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(output.stdout, b"a\nB\nc\n");
}

#[test]
fn patch_mode_with_conflict_exits_nonzero_and_emits_markers() {
    let dir = tempfile::tempdir().unwrap();
    let original = write_temp(&dir, "original.txt", b"a\nQ\nc\n");
    let patch = write_temp(&dir, "change.patch", b"@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n");

    let output = Command::new(env!("CARGO_BIN_EXE_wiggle"))
        .args(["patch", original.to_str().unwrap(), patch.to_str().unwrap()])
        .output()
        .expect("failed to run wiggle binary");

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.windows(7).any(|w| w == b"<<<<<<<"));
}

#[test]
fn diff3_mode_merges_three_files() {
    let dir = tempfile::tempdir().unwrap();
    let original = write_temp(&dir, "m.txt", b"a\nb\nc\n");
    let before = write_temp(&dir, "b.txt", b"a\nb\nc\n");
    let after = write_temp(&dir, "a.txt", b"a\nB\nc\n");

    let output = Command::new(env!("CARGO_BIN_EXE_wiggle"))
        .args(["diff3", original.to_str().unwrap(), before.to_str().unwrap(), after.to_str().unwrap()])
        .output()
        .expect("failed to run wiggle binary");

    assert!(output.status.success());
    assert_eq!(output.stdout, b"a\nB\nc\n");
}

#[test]
fn missing_input_file_exits_with_failure_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.txt");
    let patch = write_temp(&dir, "change.patch", b"@@ -1,1 +1,1 @@\n-a\n+A\n");

    let output = Command::new(env!("CARGO_BIN_EXE_wiggle"))
        .args(["patch", missing.to_str().unwrap(), patch.to_str().unwrap()])
        .output()
        .expect("failed to run wiggle binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("wiggle:"));
}
