//! Multi-hunk patch placement into a reorganized file (spec.md §8, scenario 5).

use wiggle::{MergeOptions, apply_patch};

#[test]
fn two_hunks_each_find_their_own_locality() {
    let original = b"fn one() {}\nfiller\nfiller\nfn two() {}\n";
    let patch = b"@@ -1,1 +1,1 @@\n-fn one() {}\n+fn ONE() {}\n@@ -4,1 +4,1 @@\n-fn two() {}\n+fn TWO() {}\n";
    let (out, stats) = apply_patch(original, patch, &MergeOptions::default()).unwrap();
    assert_eq!(out, b"fn ONE() {}\nfiller\nfiller\nfn TWO() {}\n");
    assert_eq!(stats.conflicts, 0);
}

#[test]
fn hunks_still_place_correctly_after_unrelated_lines_are_inserted_between_them() {
    let original = b"fn one() {}\nfn two() {}\n";
    // Simulates drift: two blank filler lines appeared between the hunks'
    // targets since the patch was generated against a smaller file.
    let drifted = b"fn one() {}\nnew\nnew\nfn two() {}\n";
    let patch = b"@@ -1,1 +1,1 @@\n-fn one() {}\n+fn ONE() {}\n@@ -2,1 +2,1 @@\n-fn two() {}\n+fn TWO() {}\n";
    let (out, stats) = apply_patch(drifted, patch, &MergeOptions::default()).unwrap();
    let _ = original;
    assert_eq!(out, b"fn ONE() {}\nnew\nnew\nfn TWO() {}\n");
    assert_eq!(stats.conflicts, 0);
}
