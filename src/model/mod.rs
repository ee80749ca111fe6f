//! Core data types shared across the merge pipeline.

mod csl;
mod elmnt;
mod merge_segment;

pub use csl::{Csl, CslEntry};
pub use elmnt::{Elmnt, ElmntKind, File};
pub use merge_segment::{MergeSegment, SegmentType};

/// The three tokenized files a merge runs over: original (`m`), one side's
/// edit (`b`, "before"), and the other side's edit (`a`, "after").
#[derive(Debug, Clone)]
pub struct ThreeWayFiles {
    pub m: File,
    pub b: File,
    pub a: File,
}

impl ThreeWayFiles {
    #[must_use]
    pub fn new(m: File, b: File, a: File) -> Self {
        Self { m, b, a }
    }
}
