//! Tokenized elements and the files built from them.

use std::sync::Arc;

/// What an [`Elmnt`] represents: ordinary tokenized content, or a chunk
/// marker inserted by the Extractor to separate hunks in an extracted
/// patch stream.
///
/// A `ChunkMarker` never compares equal to anything but an equal
/// `ChunkMarker` (see [`Elmnt::content_eq`]), and its chunk index is
/// available in O(1) without re-parsing bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElmntKind {
    Normal,
    ChunkMarker { chunk: u32, line: u32, count: u32 },
}

/// One tokenized unit: a byte range into the owning [`File`]'s buffer, a
/// leading-whitespace prefix length, a trailing extension length (used by
/// `IgnoreBlanks` mode), and a content hash.
///
/// `start`/`len` bound the hashed, comparable core of the element.
/// `prefix` bytes sit immediately before `start`; `plen` bytes sit
/// immediately after `start + len`. Concatenating `prefix ++ core ++ plen`
/// for every element in sequence reproduces the source buffer exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elmnt {
    pub start: usize,
    pub len: usize,
    pub plen: usize,
    pub prefix: usize,
    pub hash: u32,
    pub kind: ElmntKind,
}

impl Elmnt {
    #[must_use]
    pub const fn is_chunk_marker(&self) -> bool {
        matches!(self.kind, ElmntKind::ChunkMarker { .. })
    }

    #[must_use]
    pub const fn chunk_index(&self) -> Option<u32> {
        match self.kind {
            ElmntKind::ChunkMarker { chunk, .. } => Some(chunk),
            ElmntKind::Normal => None,
        }
    }

    /// The hashed, comparable core bytes: `buf[start..start+len)`.
    #[must_use]
    pub fn core<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.start..self.start + self.len]
    }

    /// The leading-whitespace prefix bytes, `buf[start-prefix..start)`.
    #[must_use]
    pub fn prefix_bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.start - self.prefix..self.start]
    }

    /// The full span this element consumes, including `plen`'s trailing
    /// extension but excluding the leading `prefix`.
    #[must_use]
    pub fn full<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.start..self.start + self.len + self.plen]
    }

    /// `true` if this element ends a line: its last byte is `\n`, or it is
    /// a chunk marker (chunk markers always bound a hunk, so they behave
    /// like a line boundary for cut-point purposes).
    #[must_use]
    pub fn is_line_ender(&self, buf: &[u8]) -> bool {
        if self.is_chunk_marker() {
            return true;
        }
        let end = self.start + self.len + self.plen;
        end > 0 && buf[end - 1] == b'\n'
    }

    /// Equality per spec.md §3: same hash, same length, same bytes — except
    /// chunk markers, which compare only by chunk index and never equal a
    /// `Normal` element regardless of byte content.
    #[must_use]
    pub fn content_eq(&self, buf_a: &[u8], other: &Elmnt, buf_b: &[u8]) -> bool {
        match (self.kind, other.kind) {
            (ElmntKind::ChunkMarker { chunk: x, .. }, ElmntKind::ChunkMarker { chunk: y, .. }) => {
                x == y
            }
            (ElmntKind::ChunkMarker { .. }, ElmntKind::Normal)
            | (ElmntKind::Normal, ElmntKind::ChunkMarker { .. }) => false,
            (ElmntKind::Normal, ElmntKind::Normal) => {
                self.hash == other.hash && self.len == other.len && self.core(buf_a) == other.core(buf_b)
            }
        }
    }
}

/// An ordered sequence of [`Elmnt`]s tiling a shared, reference-counted
/// byte buffer.
///
/// The `Arc<[u8]>` buffer is the Rust rendition of spec.md §5's "the buffer
/// must outlive all derived Files": rather than tying `File` to a borrowed
/// lifetime, the buffer is owned and cheaply shared, so a `File` is an
/// owned, cloneable value a caller can move across threads.
#[derive(Debug, Clone)]
pub struct File {
    bytes: Arc<[u8]>,
    elements: Vec<Elmnt>,
}

impl File {
    #[must_use]
    pub fn new(bytes: Arc<[u8]>, elements: Vec<Elmnt>) -> Self {
        Self { bytes, elements }
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn elements(&self) -> &[Elmnt] {
        &self.elements
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn element(&self, i: usize) -> &Elmnt {
        &self.elements[i]
    }

    /// `true` if `self[i]` and `other[j]` are the same element content.
    #[must_use]
    pub fn elements_eq(&self, i: usize, other: &File, j: usize) -> bool {
        self.elements[i].content_eq(&self.bytes, &other.elements[j], &other.bytes)
    }
}
