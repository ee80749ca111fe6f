//! LCS of two element sequences (spec.md §4.3).
//!
//! Computes the Myers shortest-edit-script via the classic forward search
//! plus backtrack: a per-cost-`d` snapshot of the furthest-reaching `x` on
//! each diagonal `k` is recorded, then the path is replayed backwards from
//! `(n, m)` to `(0, 0)` to recover the snake (match) runs. This realizes
//! spec.md §4.3's O(ND) time bound using the same forward search the spec
//! describes; the trace is kept as one `Vec<isize>` per cost level rather
//! than the stricter O(N+M)-auxiliary-space midpoint-crossing recursion —
//! see DESIGN.md for the rationale. The result is identical: a Csl of
//! matching runs, strictly increasing in both coordinates.

use crate::model::{Csl, File};

/// Compute the LCS of two complete element sequences.
#[must_use]
pub fn diff(a: &File, b: &File) -> Csl {
    diff_partial(a, b, 0, a.len(), 0, b.len())
}

/// Compute the LCS of the sub-ranges `a[alo..ahi)` and `b[blo..bhi)`.
#[must_use]
pub fn diff_partial(a: &File, b: &File, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Csl {
    let n = ahi - alo;
    let m = bhi - blo;

    let raw = if n == 0 || m == 0 {
        Vec::new()
    } else {
        let trace = myers_trace(n, m, |x, y| a.elements_eq(alo + x, b, blo + y));
        let ops = backtrack(n, m, &trace);
        let mut matches = Vec::new();
        for (x1, y1, x2, y2) in ops {
            if x2 - x1 == 1 && y2 - y1 == 1 {
                matches.push((alo + x1 as usize, blo + y1 as usize, 1usize));
            }
        }
        matches
    };

    let fixed = fixup(raw, a, b);

    let mut csl = Csl::with_capacity(fixed.len() + 1);
    for (ea, eb, len) in fixed {
        csl.push_match(ea, eb, len);
    }
    csl.push_sentinel(ahi, bhi);
    csl
}

/// Forward Myers search. Returns one `V` snapshot per cost level `d`,
/// `trace[d]` holding the furthest-reaching `x` for each diagonal as it
/// stood *before* cost `d`'s own diagonals were updated (so backtrack can
/// replay cost `d`'s step using `d`'s snapshot).
fn myers_trace(n: usize, m: usize, eq: impl Fn(usize, usize) -> bool) -> Vec<Vec<isize>> {
    let max = n + m;
    let offset = max as isize;
    let size = 2 * max + 1;
    let mut v = vec![0isize; size];
    let mut trace = Vec::with_capacity(max + 1);

    for d in 0..=max {
        trace.push(v.clone());
        let d_i = d as isize;
        let mut k = -d_i;
        while k <= d_i {
            let idx = |k: isize| (k + offset) as usize;
            let mut x = if k == -d_i || (k != d_i && v[idx(k - 1)] < v[idx(k + 1)]) {
                v[idx(k + 1)]
            } else {
                v[idx(k - 1)] + 1
            };
            let mut y = x - k;
            while (x as usize) < n && (y as usize) < m && eq(x as usize, y as usize) {
                x += 1;
                y += 1;
            }
            v[idx(k)] = x;
            if x >= n as isize && y >= m as isize {
                return trace;
            }
            k += 2;
        }
    }
    trace
}

/// Replay the recorded trace backwards from `(n, m)` to `(0, 0)`, yielding
/// edit-graph transitions in forward order: `(x1, y1, x2, y2)` for each
/// step, where a diagonal step (`x2-x1 == 1 && y2-y1 == 1`) is a match and
/// any other step is a single insertion or deletion.
fn backtrack(n: usize, m: usize, trace: &[Vec<isize>]) -> Vec<(isize, isize, isize, isize)> {
    let mut ops = Vec::new();
    let offset = trace.first().map_or(0, |v| (v.len() as isize - 1) / 2);
    let mut x = n as isize;
    let mut y = m as isize;

    for d in (0..trace.len()).rev() {
        let v = &trace[d];
        let idx = |k: isize| (k + offset) as usize;
        let d_i = d as isize;
        let k = x - y;
        let prev_k = if k == -d_i || (k != d_i && v[idx(k - 1)] < v[idx(k + 1)]) { k + 1 } else { k - 1 };
        let prev_x = v[idx(prev_k)];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push((x - 1, y - 1, x, y));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            ops.push((prev_x, prev_y, x, y));
        }
        x = prev_x;
        y = prev_y;
    }
    ops.reverse();
    ops
}

/// Slide single-element insertions/deletions across matching run
/// boundaries (spec.md §4.3 "Fix-up pass"): when exactly one element is
/// inserted on one side between two adjacent matching runs, and that
/// element's content equals the preceding run's last element, move the
/// boundary so the preceding run loses its last element (and may vanish).
/// If the slid element is itself a line-ender, keep sliding until the
/// resulting boundary lands at end-of-line or the run is exhausted.
fn fixup(mut entries: Vec<(usize, usize, usize)>, file_a: &File, file_b: &File) -> Vec<(usize, usize, usize)> {
    let mut i = 0;
    while i + 1 < entries.len() {
        let mut cur = entries[i];
        let next = entries[i + 1];
        let a_gap = next.0 - (cur.0 + cur.2);
        let b_gap = next.1 - (cur.1 + cur.2);

        let slid = if a_gap == 1 && b_gap == 0 {
            slide_one_side(&mut cur, file_a, true)
        } else if b_gap == 1 && a_gap == 0 {
            slide_one_side(&mut cur, file_b, false)
        } else {
            false
        };

        entries[i] = cur;
        if slid && cur.2 == 0 {
            entries.remove(i);
            if i > 0 {
                i -= 1;
            }
            continue;
        }
        i += 1;
    }
    entries.retain(|e| e.2 > 0);
    entries
}

/// Try to shrink `cur`'s tail by one element if the gap element (the one
/// that follows `cur` on the side whose file is `file`) equals `cur`'s
/// current last element on that same side. Repeats while the gap element
/// is a line-ender, to land the boundary at end-of-line. Returns whether
/// any shrink happened.
fn slide_one_side(cur: &mut (usize, usize, usize), file: &File, on_a: bool) -> bool {
    let mut shrunk = false;
    loop {
        if cur.2 == 0 {
            break;
        }
        let start = if on_a { cur.0 } else { cur.1 };
        let gap_idx = start + cur.2;
        let tail_idx = start + cur.2 - 1;
        if gap_idx >= file.len() {
            break;
        }
        if !file.elements_eq(gap_idx, file, tail_idx) {
            break;
        }
        let gap_is_line_ender = file.element(gap_idx).is_line_ender(file.bytes());
        cur.2 -= 1;
        shrunk = true;
        if !gap_is_line_ender {
            break;
        }
    }
    shrunk
}
