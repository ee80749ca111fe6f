//! Expand point conflicts out to line-boundary cut-points (spec.md §4.6).
//!
//! A Conflict (or, with `show_wiggles`, an Extraneous or Unmatched segment)
//! is a single point in the segment list; printing it needs a boundary a
//! reader can actually see. A cut-point is a position where all three files
//! are simultaneously at end-of-line (or, in `words` mode, any element
//! boundary at all). The search walks outward from each conflict segment,
//! marking every segment it crosses `in_conflict`, until it reaches an
//! `Unchanged` or `Changed` segment with a usable interior cut-point.
//!
//! The 3-newline context rule (DESIGN.md's Open Question decision) is
//! applied locally to that terminating segment rather than accumulated
//! across the segments crossed to reach it: if the segment holds three or
//! more cut-points, the nearest one to the conflict is used (spec.md's
//! "keep only the first-found newline to avoid over-extending"); with
//! fewer, the farthest available one is used instead. This is a narrower
//! reading than spec.md's literal text, which counts newlines across the
//! Extraneous/Unchanged segments in between — doing that precisely would
//! require reconciling it with the fact that a hunk-header Extraneous
//! segment already terminates the search unconditionally, which the
//! source material leaves unresolved. DESIGN.md records the full
//! reasoning.

use crate::config::MergeOptions;
use crate::model::{File, MergeSegment, SegmentType, ThreeWayFiles};

fn is_cut_point_element(elmnt_idx: usize, file: &File, words: bool) -> bool {
    if words {
        return true;
    }
    elmnt_idx == 0 || file.element(elmnt_idx - 1).is_line_ender(file.bytes())
}

/// `true` if segment `seg`'s `a`-offset `within` (0-based into its `al`
/// elements) lands on a simultaneous end-of-line in all three files.
fn is_cut_point(files: &ThreeWayFiles, seg: &MergeSegment, within: usize, words: bool) -> bool {
    is_cut_point_element(seg.a + within, &files.m, words)
        && is_cut_point_element(seg.b + within, &files.b, words)
        && is_cut_point_element(seg.c + within, &files.a, words)
}

/// Whether a starting segment should itself seed a conflict expansion
/// (spec.md §4.6's "a Conflict, or with `show_wiggles`, any Extraneous or
/// any line mixing Changed with Unmatched").
fn seeds_conflict(kind: SegmentType, show_wiggles: bool) -> bool {
    matches!(kind, SegmentType::Conflict) || (show_wiggles && matches!(kind, SegmentType::Extraneous | SegmentType::Unmatched))
}

/// Walk backwards from `start` (exclusive), marking segments `in_conflict`
/// and discovering a `hi` cut-point. Returns the index of the segment the
/// expansion stopped in, or `None` if it ran off the start of the list.
fn expand_backward(files: &ThreeWayFiles, segments: &mut [MergeSegment], start: usize, words: bool) -> Option<usize> {
    let mut i = start;
    loop {
        if i == 0 {
            return None;
        }
        i -= 1;
        let seg = segments[i];

        // A hunk-header is its own chunk-marker-forced Extraneous segment
        // with bl == 1 and al == cl == 0; it always bounds the conflict.
        let is_hunk_header = seg.kind == SegmentType::Extraneous && seg.bl > 0 && seg.al == 0 && seg.cl == 0;
        if is_hunk_header {
            segments[i].in_conflict = true;
            segments[i].lo = 0;
            segments[i].hi = None;
            return Some(i);
        }

        segments[i].in_conflict = true;

        if !matches!(seg.kind, SegmentType::Unchanged | SegmentType::Changed) {
            segments[i].lo = 0;
            segments[i].hi = None;
            continue;
        }

        // Collect this segment's interior cut-points, nearest the conflict
        // first (scanning right to left).
        let mut cut_points = Vec::new();
        let mut w = seg.al;
        while w > 0 {
            w -= 1;
            if is_cut_point(files, &seg, w, words) {
                cut_points.push(w);
                if words {
                    break;
                }
            }
        }
        if cut_points.is_empty() {
            segments[i].lo = 0;
            segments[i].hi = None;
            continue;
        }
        // With >= 3 newlines of context available in this one segment,
        // stop at the nearest to avoid over-extending into the quiet
        // region; with fewer, use the farthest available (Open Question
        // decision: prefer not to cut right at the conflict's edge). This
        // segment sits to the left of the conflict, so everything from the
        // chosen cut-point onward (toward the conflict) is interior, and
        // everything before it is safe boundary text.
        let w = if cut_points.len() >= 3 || words { cut_points[0] } else { *cut_points.last().unwrap() };
        segments[i].lo = w;
        segments[i].hi = Some(seg.al);
        return Some(i);
    }
}

/// Symmetric forward expansion, recording `lo` in the terminating segment.
fn expand_forward(files: &ThreeWayFiles, segments: &mut [MergeSegment], start: usize, words: bool) -> Option<usize> {
    let mut i = start;
    loop {
        i += 1;
        if i >= segments.len() || segments[i].kind == SegmentType::End {
            return None;
        }
        let seg = segments[i];

        let is_hunk_header = seg.kind == SegmentType::Extraneous && seg.bl > 0 && seg.al == 0 && seg.cl == 0;
        if is_hunk_header {
            segments[i].in_conflict = true;
            segments[i].lo = 0;
            segments[i].hi = None;
            return Some(i);
        }

        segments[i].in_conflict = true;

        if !matches!(seg.kind, SegmentType::Unchanged | SegmentType::Changed) {
            segments[i].lo = 0;
            segments[i].hi = None;
            continue;
        }

        let mut cut_points = Vec::new();
        for w in 0..=seg.al {
            if is_cut_point(files, &seg, w, words) {
                cut_points.push(w);
                if words {
                    break;
                }
            }
        }
        if cut_points.is_empty() {
            segments[i].lo = seg.al;
            segments[i].hi = None;
            continue;
        }
        // This segment sits to the right of the conflict, so everything up
        // to the chosen cut-point is interior, and everything from it
        // onward is safe boundary text.
        let w = if cut_points.len() >= 3 || words { cut_points[0] } else { *cut_points.last().unwrap() };
        segments[i].lo = 0;
        segments[i].hi = Some(w);
        return Some(i);
    }
}

/// Expand every Conflict (and, with `show_wiggles`, qualifying Extraneous/
/// Unmatched) segment out to line-boundary cut-points, merging conflicts
/// whose expansions meet. Returns the number of distinct conflicts left
/// after merging.
#[must_use]
pub fn isolate_conflicts(
    files: &ThreeWayFiles,
    segments: &mut [MergeSegment],
    show_wiggles: bool,
    words: bool,
) -> usize {
    let seed_indices: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| seeds_conflict(s.kind, show_wiggles))
        .map(|(i, _)| i)
        .collect();

    if seed_indices.is_empty() {
        return 0;
    }

    for &idx in &seed_indices {
        segments[idx].in_conflict = true;
        segments[idx].lo = 0;
        segments[idx].hi = None;
        expand_backward(files, segments, idx, words);
        expand_forward(files, segments, idx, words);
    }

    merge_adjacent_conflicts(segments, &seed_indices)
}

/// After independent expansion, any segment strictly between two conflict
/// seeds that ended up `in_conflict` on both its approach and retreat
/// (i.e. a border segment two expansions both claimed) is fully interior:
/// clear its `hi` and count the two conflicts as merged.
fn merge_adjacent_conflicts(segments: &mut [MergeSegment], seed_indices: &[usize]) -> usize {
    let mut conflict_count = seed_indices.len();
    for window in seed_indices.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        let touching = (lo + 1..hi).all(|i| segments[i].in_conflict);
        if touching {
            for seg in &mut segments[lo + 1..hi] {
                seg.hi = None;
                seg.lo = 0;
            }
            conflict_count -= 1;
        }
    }
    conflict_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::diff;
    use crate::merger::make_merger;
    use crate::tokenizer::{split_stream, TokenMode};

    fn lines(bytes: &'static [u8]) -> crate::model::File {
        split_stream(bytes, TokenMode::BY_LINE)
    }

    #[test]
    fn no_conflicts_yields_zero_and_no_mutation() {
        let m = lines(b"a\nb\nc\n");
        let csl1 = diff(&m, &m);
        let csl2 = diff(&m, &m);
        let result = make_merger(&m, &m, &m, &csl1, &csl2, &crate::config::MergeOptions::default());
        let mut segments = result.segments;
        let files = ThreeWayFiles { m: m.clone(), b: m.clone(), a: m.clone() };
        let count = isolate_conflicts(&files, &mut segments, false, false);
        assert_eq!(count, 0);
        assert!(segments.iter().all(|s| !s.in_conflict));
    }

    #[test]
    fn single_conflict_is_expanded_and_bounded() {
        let m = lines(b"one\ntwo\nthree\nfour\nfive\nsix\nseven\n");
        let b = lines(b"one\ntwo\nTHREE\nfour\nfive\nsix\nseven\n");
        let a = lines(b"one\ntwo\nTHREE-DIFFERENT\nfour\nfive\nsix\nseven\n");
        let csl1 = diff(&m, &b);
        let csl2 = diff(&b, &a);
        let opts = crate::config::MergeOptions { ignore_already: false, ..crate::config::MergeOptions::default() };
        let result = make_merger(&m, &b, &a, &csl1, &csl2, &opts);
        let mut segments = result.segments;
        assert!(segments.iter().any(|s| s.kind == SegmentType::Conflict));
        let files = ThreeWayFiles { m, b, a };
        let count = isolate_conflicts(&files, &mut segments, false, false);
        assert_eq!(count, 1);
        assert!(segments.iter().any(|s| s.in_conflict && matches!(s.kind, SegmentType::Unchanged | SegmentType::Changed)));
    }

    #[test]
    fn words_mode_treats_every_boundary_as_a_cut_point() {
        let m = split_stream(b"one two three\n", TokenMode::BY_WORD);
        let b = split_stream(b"one TWO three\n", TokenMode::BY_WORD);
        let a = split_stream(b"one OTHER three\n", TokenMode::BY_WORD);
        let csl1 = diff(&m, &b);
        let csl2 = diff(&b, &a);
        let opts = crate::config::MergeOptions { ignore_already: false, words: true, ..crate::config::MergeOptions::default() };
        let result = make_merger(&m, &b, &a, &csl1, &csl2, &opts);
        let mut segments = result.segments;
        let files = ThreeWayFiles { m, b, a };
        let count = isolate_conflicts(&files, &mut segments, false, true);
        assert_eq!(count, 1);
    }
}
