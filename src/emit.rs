//! Render a classified merge segment list as conflict-marker text
//! (spec.md §4.7).
//!
//! Non-conflict segments are emitted directly from whichever file owns the
//! authoritative text (`file_m` for Unchanged/Unmatched/AlreadyApplied,
//! `file_a` for Changed; Extraneous emits nothing). A segment with
//! `in_conflict == true` opens a conflict block instead: the three streams
//! are emitted in order across the whole expanded span, including the
//! non-conflict tails `[a, a+lo)`/`[a+hi, a+al)` of the border
//! Unchanged/Changed segments the Isolator left attached to the block.

use std::io::{self, Write};

use crate::config::MergeOptions;
use crate::model::{MergeSegment, SegmentType, ThreeWayFiles};

/// The `(conflicts, wiggles, ignored)` triple spec.md §6/§7 names as the
/// contract with CLI/browser collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub conflicts: usize,
    pub wiggles: usize,
    pub ignored: usize,
}

struct Delims {
    open: &'static [u8],
    base: &'static [u8],
    mid: &'static [u8],
    result: &'static [u8],
    close: &'static [u8],
    newline_framed: bool,
}

const LINE_DELIMS: Delims = Delims {
    open: b"<<<<<<<\n",
    base: b"|||||||\n",
    mid: b"=======\n",
    result: b"&&&&&&&\n",
    close: b">>>>>>>\n",
    newline_framed: true,
};

const WORD_DELIMS: Delims = Delims {
    open: b"<<<---",
    base: b"|||",
    mid: b"===",
    result: b"&&&",
    close: b"--->>>",
    newline_framed: false,
};

/// Emit segment `seg`'s own text (non-conflict case) from whichever file
/// owns it, per spec.md §4.7's source-file table.
fn emit_plain(out: &mut impl Write, files: &ThreeWayFiles, seg: &MergeSegment) -> io::Result<()> {
    match seg.kind {
        SegmentType::Unchanged | SegmentType::Unmatched | SegmentType::AlreadyApplied => {
            emit_span(out, &files.m, seg.a, seg.al)
        }
        SegmentType::Changed => emit_span(out, &files.a, seg.c, seg.cl),
        SegmentType::Extraneous | SegmentType::Conflict | SegmentType::End => Ok(()),
    }
}

/// Emit `file`'s elements `[start, start+count)`, each as `prefix ++ core
/// ++ plen` so the source buffer's bytes reproduce verbatim.
fn emit_span(out: &mut impl Write, file: &crate::model::File, start: usize, count: usize) -> io::Result<()> {
    let buf = file.bytes();
    for i in start..start + count {
        let e = file.element(i);
        out.write_all(e.prefix_bytes(buf))?;
        out.write_all(e.full(buf))?;
    }
    Ok(())
}

/// The span of a conflict block's border segment that lies within the
/// conflict (`[lo, hi)` into its own `al`/`bl`/`cl`-indexed text) versus
/// the safe boundary tails that precede/follow it. `side` selects which
/// file's offset/length this border segment contributes on.
fn emit_border_tail(out: &mut impl Write, file: &crate::model::File, offset: usize, lo: usize) -> io::Result<()> {
    emit_span(out, file, offset, lo)
}

fn emit_border_head(out: &mut impl Write, file: &crate::model::File, offset: usize, total: usize, hi: usize) -> io::Result<()> {
    emit_span(out, file, offset + hi, total - hi)
}

/// Emit one conflict block spanning `segments[range]`: the `<<<<<<<`
/// (optional `|||||||`) `=======` (optional `&&&&&&&`) `>>>>>>>` sequence,
/// each section built from the corresponding file's bytes across the
/// whole expanded span.
fn emit_conflict_block(
    out: &mut impl Write,
    files: &ThreeWayFiles,
    segments: &[MergeSegment],
    range: std::ops::Range<usize>,
    options: &MergeOptions,
    delims: &Delims,
) -> io::Result<()> {
    let block = &segments[range.clone()];
    let had_true_conflict = block.iter().any(|s| s.kind == SegmentType::Conflict);

    out.write_all(delims.open)?;
    for seg in block {
        emit_block_side(out, &files.m, seg, seg.a, |s| s.al)?;
    }
    if !options.words {
        out.write_all(delims.base)?;
        for seg in block {
            emit_block_side(out, &files.b, seg, seg.b, |s| s.bl)?;
        }
    }
    out.write_all(delims.mid)?;
    for seg in block {
        emit_block_side(out, &files.a, seg, seg.c, |s| s.cl)?;
    }

    if options.show_wiggles && !had_true_conflict {
        out.write_all(delims.result)?;
        for seg in block {
            // Extraneous segments are skipped entirely in the wiggled-result
            // view (spec.md §9 / DESIGN.md Open Question decision #3).
            match seg.kind {
                SegmentType::Extraneous => {}
                SegmentType::Changed => emit_span(out, &files.a, seg.c, seg.cl)?,
                _ => emit_span(out, &files.m, seg.a, seg.al)?,
            }
        }
    }
    out.write_all(delims.close)?;
    if !delims.newline_framed {
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Emit one file's contribution for a single border/interior segment
/// within a conflict block: the whole span for a fully-interior segment
/// (`lo == 0`, `hi == None`), or just its `[0, lo)`/`[hi, len)` safe tails
/// for a segment the Isolator left partially outside the conflict.
fn emit_block_side(
    out: &mut impl Write,
    file: &crate::model::File,
    seg: &MergeSegment,
    offset: usize,
    len_of: impl Fn(&MergeSegment) -> usize,
) -> io::Result<()> {
    let len = len_of(seg);
    if !seg.in_conflict {
        return emit_span(out, file, offset, len);
    }
    match seg.hi {
        None => emit_span(out, file, offset, len),
        Some(hi) => {
            emit_border_tail(out, file, offset, seg.lo.min(len))?;
            emit_border_head(out, file, offset, len, hi.min(len))
        }
    }
}

/// Render `segments` (already classified by [`crate::merger::make_merger`]
/// and expanded by [`crate::isolate::isolate_conflicts`]) as text,
/// returning the `(conflicts, wiggles, ignored)` stats.
///
/// # Errors
/// Propagates any I/O error from `out`.
pub fn print_merge(
    out: &mut impl Write,
    files: &ThreeWayFiles,
    segments: &[MergeSegment],
    conflicts: usize,
    wiggles: usize,
    ignored: usize,
    options: &MergeOptions,
) -> io::Result<MergeStats> {
    let delims = if options.words { &WORD_DELIMS } else { &LINE_DELIMS };
    let mut i = 0;
    while i < segments.len() {
        let seg = segments[i];
        if seg.kind == SegmentType::End {
            break;
        }
        if seg.in_conflict {
            let start = i;
            while i < segments.len() && segments[i].in_conflict {
                i += 1;
            }
            emit_conflict_block(out, files, segments, start..i, options, delims)?;
            continue;
        }
        emit_plain(out, files, &seg)?;
        i += 1;
    }
    Ok(MergeStats { conflicts, wiggles, ignored })
}
