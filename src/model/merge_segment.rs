//! The Merger's output type: a classified region of the three-way merge.

/// How a [`MergeSegment`] was classified by the Merger's match1/match2
/// table (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    /// All three files agree over this span.
    Unchanged,
    /// `before` matches `original`; `after` differs — a normal edit.
    Changed,
    /// `before` has text with no counterpart in `original` — a patch
    /// hunk header, or b-side-only content.
    Extraneous,
    /// `original` has text with no counterpart in `before`.
    Unmatched,
    /// Neither CSL covers this span: the merge cannot decide a single
    /// outcome here.
    Conflict,
    /// A putative conflict where `original` already equals `after`
    /// bytewise — the patch is a no-op over this span.
    AlreadyApplied,
    /// Terminal marker; always the last segment in a finished merge list.
    End,
}

/// A classified region of the merge, expressed as start indices and
/// lengths into the three tokenized files.
///
/// `lo`/`hi` are offsets within `al` carving out the portion of an
/// `Unchanged`/`Changed` segment that lies *outside* an enclosing
/// conflict: `[a, a+lo)` and `[a+hi, a+al)` are safe boundary text, while
/// `[a+lo, a+hi)` is interior to the conflict. `hi == -1` (represented here
/// as `None`) means the segment is fully interior — used when two
/// expanding conflicts meet and merge (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSegment {
    pub kind: SegmentType,
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub al: usize,
    pub bl: usize,
    pub cl: usize,
    pub in_conflict: bool,
    pub lo: usize,
    pub hi: Option<usize>,
    pub oldtype: SegmentType,
}

impl MergeSegment {
    #[must_use]
    pub fn new(kind: SegmentType, a: usize, b: usize, c: usize, al: usize, bl: usize, cl: usize) -> Self {
        Self {
            kind,
            a,
            b,
            c,
            al,
            bl,
            cl,
            in_conflict: false,
            lo: 0,
            hi: Some(al),
            oldtype: kind,
        }
    }

    #[must_use]
    pub fn end(a: usize, b: usize, c: usize) -> Self {
        Self::new(SegmentType::End, a, b, c, 0, 0, 0)
    }

    /// `true` if this segment borders a conflict on its right with some
    /// interior span (`hi` less than the full length, or `hi` cleared to
    /// fully-interior).
    #[must_use]
    pub const fn has_conflict_interior(&self) -> bool {
        self.in_conflict && (self.lo > 0 || !matches!(self.hi, Some(hi) if hi == self.al))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_to_fully_safe_boundaries() {
        let seg = MergeSegment::new(SegmentType::Unchanged, 0, 0, 0, 5, 5, 5);
        assert_eq!(seg.lo, 0);
        assert_eq!(seg.hi, Some(5));
        assert!(!seg.in_conflict);
        assert_eq!(seg.oldtype, SegmentType::Unchanged);
    }

    #[test]
    fn end_segment_has_zero_lengths() {
        let seg = MergeSegment::end(3, 4, 5);
        assert_eq!(seg.kind, SegmentType::End);
        assert_eq!(seg.al, 0);
    }
}
