//! Place a multi-hunk patch into its best locality in the target file
//! (spec.md §4.4).
//!
//! Each hunk is scored against the remaining, unplaced suffix of the target
//! file by running the Differ itself over `[search_lo, a.len())` against
//! that hunk's body in `b` — the Differ's own LCS is the scoring function,
//! rather than the hand-rolled matrix-walk `val`/`inmatch` bookkeeping
//! spec.md describes (see DESIGN.md for the rationale: both converge on
//! "best LCS alignment", and reusing the already-verified Differ avoids a
//! second, harder-to-verify-by-inspection scoring pass). The tight bounding
//! box of a hunk's matches becomes its placement; placements are found in
//! patch order, each constrained to start after the previous hunk's end,
//! which enforces the monotonic ordering spec.md step 6 restores by
//! recursion. A hunk with zero matches is left unplaced (zero width) so it
//! surfaces as a genuine conflict downstream rather than stretching into
//! unrelated text.

use crate::differ::diff_partial;
use crate::model::{Csl, File};

/// Locate the `[lo, hi)` range in `b`'s elements that is chunk `chunk`'s
/// body: the span strictly between its chunk-marker and the next one (or
/// end of file).
fn chunk_body_range(b: &File, chunk: u32) -> Option<(usize, usize)> {
    let marker_idx = b.elements().iter().position(|e| e.chunk_index() == Some(chunk))?;
    let lo = marker_idx + 1;
    let hi = b
        .elements()
        .iter()
        .enumerate()
        .skip(lo)
        .find(|(_, e)| e.is_chunk_marker())
        .map_or(b.len(), |(i, _)| i);
    Some((lo, hi))
}

/// Extend `[lo, hi)` outward to whole-line boundaries in `file`: `lo` moves
/// back until the preceding element is a line-ender (or `lo` hits 0), `hi`
/// moves forward until the element just before it is a line-ender (or `hi`
/// hits the file's end).
fn extend_to_lines(file: &File, mut lo: usize, mut hi: usize, floor: usize, ceil: usize) -> (usize, usize) {
    while lo > floor && !file.element(lo - 1).is_line_ender(file.bytes()) {
        lo -= 1;
    }
    while hi < ceil && (hi == 0 || !file.element(hi - 1).is_line_ender(file.bytes())) {
        hi += 1;
    }
    (lo, hi)
}

/// Place a `chunks`-hunk patch's before-stream `b` (chunk-marked, per
/// `split_patch`) into its best locality within `a`, the current target
/// file.
#[must_use]
pub fn pdiff(a: &File, b: &File, chunks: u32) -> Csl {
    let mut result = Csl::with_capacity(chunks as usize);
    let mut search_lo = 0usize;

    for chunk in 1..=chunks {
        let Some((blo, bhi)) = chunk_body_range(b, chunk) else { continue };
        if blo >= bhi {
            continue;
        }

        let probe = diff_partial(a, b, search_lo, a.len(), blo, bhi);
        let matched: Vec<_> = probe.entries().iter().filter(|e| !e.is_sentinel()).collect();
        if matched.is_empty() {
            continue;
        }

        let xlo = matched.iter().map(|e| e.a).min().unwrap();
        let xhi = matched.iter().map(|e| e.a_end()).max().unwrap();
        let (xlo, xhi) = extend_to_lines(a, xlo, xhi, search_lo, a.len());

        let placed = diff_partial(a, b, xlo, xhi, blo, bhi);
        for e in placed.entries().iter().filter(|e| !e.is_sentinel()) {
            result.push_match(e.a, e.b, e.len);
        }
        search_lo = xhi;
    }

    result.push_sentinel(a.len(), b.len());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::split_patch;
    use crate::tokenizer::{split_stream, TokenMode};

    #[test]
    fn places_single_drifted_hunk() {
        let m = split_stream(b"x\na\nb\nc\ny\n", TokenMode::BY_LINE);
        let patch = b"@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n";
        let extracted = split_patch(patch).unwrap();
        let b_file = split_stream(&extracted.before, TokenMode::BY_LINE);
        let csl = pdiff(&m, &b_file, extracted.chunks);
        let matched: Vec<_> = csl.entries().iter().filter(|e| !e.is_sentinel()).collect();
        assert!(!matched.is_empty());
        // "a" in m is at line index 1, "c" at index 3 — the hunk should
        // land there, not at the file's start.
        assert!(matched.iter().any(|e| e.a == 1));
    }

    #[test]
    fn places_two_hunks_in_order_with_a_gap() {
        let m = split_stream(b"fn one() {}\nfiller\nfiller\nfn two() {}\n", TokenMode::BY_LINE);
        let patch = b"@@ -1,1 +1,1 @@\n-fn one() {}\n+fn ONE() {}\n@@ -4,1 +4,1 @@\n-fn two() {}\n+fn TWO() {}\n";
        let extracted = split_patch(patch).unwrap();
        let b_file = split_stream(&extracted.before, TokenMode::BY_LINE);
        let csl = pdiff(&m, &b_file, extracted.chunks);
        let entries: Vec<_> = csl.entries().iter().filter(|e| !e.is_sentinel()).collect();
        assert!(!entries.is_empty());
        let mut last_a = 0;
        for e in &entries {
            assert!(e.a >= last_a);
            last_a = e.a_end();
        }
    }

    #[test]
    fn unmatched_chunk_leaves_no_entries_but_does_not_panic() {
        let m = split_stream(b"totally unrelated content\n", TokenMode::BY_LINE);
        let patch = b"@@ -1,1 +1,1 @@\n-nothing in common whatsoever here\n+still nothing\n";
        let extracted = split_patch(patch).unwrap();
        let b_file = split_stream(&extracted.before, TokenMode::BY_LINE);
        let csl = pdiff(&m, &b_file, extracted.chunks);
        assert!(csl.entries().last().unwrap().is_sentinel());
    }
}
