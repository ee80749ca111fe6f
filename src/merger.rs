//! Fuse two common-subsequence lists into a classified merge segment list
//! (spec.md §4.5).
//!
//! The walk treats `file_b`'s element axis as the shared coordinate between
//! `csl1` (m↔b) and `csl2` (b↔a): at each step, `match1` asks "are we
//! inside an m↔b matching run" and `match2` asks "are we inside a b↔a
//! matching run", and the 2×2 table those two booleans form is spec.md's
//! classification table. Segment lengths are derived from the nearer of
//! each CSL's next boundary, per spec.md's "derived from the distances to
//! the next CSL boundary"; DESIGN.md records the exact tie-breaking rules
//! chosen for the under-specified Changed/Conflict cases.

use crate::config::MergeOptions;
use crate::model::{Csl, CslEntry, ElmntKind, File, MergeSegment, SegmentType};

/// The Merger's output: the classified segment list plus the wiggle and
/// ignored-already-applied counters spec.md §6/§7 names as part of the
/// `(conflicts, wiggles, ignored)` contract (`conflicts` itself is filled
/// in by the Isolator, which owns conflict counting).
#[derive(Debug, Clone, Default)]
pub struct MergeResult {
    pub segments: Vec<MergeSegment>,
    pub wiggles: usize,
    pub ignored: usize,
}

struct Cursor<'c> {
    entries: &'c [CslEntry],
    idx: usize,
}

impl<'c> Cursor<'c> {
    fn new(csl: &'c Csl) -> Self {
        Self { entries: csl.entries(), idx: 0 }
    }

    fn entry(&self) -> CslEntry {
        self.entries[self.idx]
    }

    /// Advance past any fully-consumed entries given the current position
    /// on both axes of this CSL.
    fn advance(&mut self, pos_a: usize, pos_b: usize) {
        while !self.entry().is_sentinel() && pos_a >= self.entry().a_end() && pos_b >= self.entry().b_end() {
            self.idx += 1;
        }
    }
}

/// Combine `csl1 = diff(file_m, file_b)` and `csl2 = diff(file_b, file_a)`
/// into a classified segment list.
#[must_use]
pub fn make_merger(file_m: &File, file_b: &File, file_a: &File, csl1: &Csl, csl2: &Csl, options: &MergeOptions) -> MergeResult {
    let mut ma = 0usize;
    let mut bb = 0usize;
    let mut ca = 0usize;
    let mut c1 = Cursor::new(csl1);
    let mut c2 = Cursor::new(csl2);
    let mut segments = Vec::new();
    let mut wiggles = 0usize;
    let mut ignored = 0usize;
    let mut prior_extraneous_had_content = false;
    // Set when a hunk-header was just crossed and not yet checked against
    // where its body actually matched: `Some(expected_ma)` — the 0-indexed
    // position in `file_m` the patch header claimed this hunk starts at.
    // Checked against csl1's freshly-advanced entry on the very next loop
    // iteration, since that entry's `.a` is exactly where BestMatch placed
    // this hunk's body (spec.md §4.4), however many Unmatched elements of
    // unrelated text precede it.
    let mut pending_marker_line: Option<usize> = None;

    loop {
        c1.advance(ma, bb);
        c2.advance(bb, ca);
        let e1 = c1.entry();
        let e2 = c2.entry();

        if let Some(expected) = pending_marker_line.take() {
            if !e1.is_sentinel() && e1.a != expected {
                wiggles += 1;
            }
        }

        let done = e1.is_sentinel() && e2.is_sentinel() && ma == e1.a && bb == e1.b && bb == e2.a && ca == e2.b;
        if done {
            segments.push(MergeSegment::end(ma, bb, ca));
            break;
        }

        // A hunk-header chunk-marker in `b` always bounds conflicts and is
        // its own length-1 Extraneous segment (spec.md §4.5/§4.6). The
        // extractor inserts a marker into `a` at the same hunk boundary
        // (spec.md §4.2), and csl2 (b↔a) matches the two markers to each
        // other; consume `a`'s marker here too so `ca` doesn't end up
        // parked on a raw marker element that a later Unchanged/Changed
        // segment would then read bytes from.
        if bb < file_b.len() && file_b.element(bb).is_chunk_marker() {
            // An Extraneous run of `before`-only content between the
            // previous hunk's body and this header is itself evidence the
            // patch didn't apply back-to-back (spec.md §4.5's "triggers a
            // wiggle event if non-header Extraneous bytes preceded it").
            if prior_extraneous_had_content {
                wiggles += 1;
            }
            if !options.words {
                if let ElmntKind::ChunkMarker { line, .. } = file_b.element(bb).kind {
                    pending_marker_line = Some((line as usize).saturating_sub(1));
                }
            }
            segments.push(MergeSegment::new(SegmentType::Extraneous, ma, bb, ca, 0, 1, 0));
            bb += 1;
            if ca < file_a.len() && file_a.element(ca).is_chunk_marker() {
                ca += 1;
            }
            prior_extraneous_had_content = false;
            continue;
        }

        let match1 = ma >= e1.a && bb >= e1.b;
        let match2 = bb >= e2.a && ca >= e2.b;

        let seg = match (match1, match2) {
            (true, true) => {
                let rem1 = e1.a_end() - ma;
                let rem2 = e2.a_end() - bb;
                let len = rem1.min(rem2);
                let seg = MergeSegment::new(SegmentType::Unchanged, ma, bb, ca, len, len, len);
                ma += len;
                bb += len;
                ca += len;
                seg
            }
            (true, false) => {
                let rem1 = e1.a_end() - ma;
                let to_e2 = e2.a.saturating_sub(bb);
                if to_e2 == 0 {
                    // b has already reached the next b↔a match's start but
                    // `a` itself is still lagging its own match start.
                    let cl = e2.b - ca;
                    let seg = MergeSegment::new(SegmentType::Changed, ma, bb, ca, 0, 0, cl);
                    ca += cl;
                    seg
                } else {
                    let len = rem1.min(to_e2);
                    let reaches_e2 = bb + len == e2.a;
                    let cl = if reaches_e2 { e2.b - ca } else { 0 };
                    let seg = MergeSegment::new(SegmentType::Changed, ma, bb, ca, len, len, cl);
                    ma += len;
                    bb += len;
                    ca += cl;
                    seg
                }
            }
            (false, true) => {
                if bb < e1.b {
                    let len = e1.b - bb;
                    let seg = MergeSegment::new(SegmentType::Extraneous, ma, bb, ca, 0, len, 0);
                    bb += len;
                    seg
                } else {
                    let len = e1.a - ma;
                    let seg = MergeSegment::new(SegmentType::Unmatched, ma, bb, ca, len, 0, 0);
                    ma += len;
                    seg
                }
            }
            (false, false) => {
                let mut al = e1.a.saturating_sub(ma);
                let mut bl = e1.b.saturating_sub(bb).min(e2.a.saturating_sub(bb));
                let mut cl = e2.b.saturating_sub(ca);
                if al == 0 && bl == 0 && cl == 0 {
                    // Safety net: every CSL-derived bound was already
                    // satisfied, which contradicts match1/match2 both being
                    // false. Force minimal progress rather than loop.
                    al = usize::from(ma < file_m.len());
                    bl = usize::from(bb < file_b.len());
                    cl = usize::from(ca < file_a.len());
                }
                let seg = MergeSegment::new(SegmentType::Conflict, ma, bb, ca, al, bl, cl);
                ma += al;
                bb += bl;
                ca += cl;
                seg
            }
        };

        let mut seg = seg;
        if options.ignore_already
            && seg.kind == SegmentType::Conflict
            && seg.al == seg.cl
            && (0..seg.al).all(|k| file_m.elements_eq(seg.a + k, file_a, seg.c + k))
        {
            seg.kind = SegmentType::AlreadyApplied;
            seg.oldtype = SegmentType::AlreadyApplied;
            ignored += 1;
        }

        prior_extraneous_had_content = seg.kind == SegmentType::Extraneous && seg.bl > 0;
        segments.push(seg);
    }

    MergeResult { segments, wiggles, ignored }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::diff;
    use crate::tokenizer::{split_stream, TokenMode};

    fn lines(bytes: &'static [u8]) -> File {
        split_stream(bytes, TokenMode::BY_LINE)
    }

    #[test]
    fn identity_merge_is_one_unchanged_segment() {
        let x = lines(b"a\nb\nc\n");
        let csl1 = diff(&x, &x);
        let csl2 = diff(&x, &x);
        let result = make_merger(&x, &x, &x, &csl1, &csl2, &MergeOptions::default());
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[0].kind, SegmentType::Unchanged);
        assert_eq!(result.segments[0].al, 3);
        assert_eq!(result.segments[1].kind, SegmentType::End);
        assert_eq!(result.wiggles, 0);
    }

    #[test]
    fn trivial_apply_changes_middle_line() {
        let m = lines(b"a\nb\nc\n");
        let b = lines(b"a\nb\nc\n");
        let a = lines(b"a\nB\nc\n");
        let csl1 = diff(&m, &b);
        let csl2 = diff(&b, &a);
        let result = make_merger(&m, &b, &a, &csl1, &csl2, &MergeOptions::default());
        let kinds: Vec<_> = result.segments.iter().map(|s| s.kind).collect();
        assert!(kinds.contains(&SegmentType::Changed));
        assert_eq!(*kinds.last().unwrap(), SegmentType::End);
    }

    #[test]
    fn conflicting_edit_yields_conflict_segment() {
        let m = lines(b"a\nb\nc\n");
        let b = lines(b"a\nB\nc\n"); // patch wants b -> B
        let a = lines(b"a\nQ\nc\n"); // but m's middle line is already Q
        let csl1 = diff(&m, &b);
        let csl2 = diff(&b, &a);
        let opts = MergeOptions { ignore_already: false, ..MergeOptions::default() };
        let result = make_merger(&m, &b, &a, &csl1, &csl2, &opts);
        assert!(result.segments.iter().any(|s| s.kind == SegmentType::Conflict));
    }

    #[test]
    fn already_applied_detected_when_enabled() {
        let m = lines(b"a\nB\nc\n"); // already has the target content
        let b = lines(b"a\nb\nc\n"); // patch's before-text
        let a = lines(b"a\nB\nc\n"); // patch's after-text — same as m here
        let csl1 = diff(&m, &b);
        let csl2 = diff(&b, &a);
        let opts = MergeOptions { ignore_already: true, ..MergeOptions::default() };
        let result = make_merger(&m, &b, &a, &csl1, &csl2, &opts);
        assert_eq!(result.ignored, 1);
        assert!(result.segments.iter().any(|s| s.kind == SegmentType::AlreadyApplied));
        assert!(!result.segments.iter().any(|s| s.kind == SegmentType::Conflict));
    }

    #[test]
    fn chunk_marker_forces_extraneous_and_counts_wiggle() {
        use crate::extractor::split_patch;
        let m = lines(b"x\na\nb\nc\ny\n");
        let patch = b"@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n";
        let extracted = split_patch(patch).unwrap();
        let b_file = split_stream(&extracted.before, TokenMode::BY_LINE);
        let a_file = split_stream(&extracted.after, TokenMode::BY_LINE);
        let csl1 = crate::bestmatch::pdiff(&m, &b_file, extracted.chunks);
        let csl2 = diff(&b_file, &a_file);
        let result = make_merger(&m, &b_file, &a_file, &csl1, &csl2, &MergeOptions::default());
        assert!(result.segments.iter().any(|s| s.kind == SegmentType::Extraneous && s.bl == 1));
    }
}
