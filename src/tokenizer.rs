//! Byte buffer → ordered sequence of hashed [`Elmnt`]s (spec.md §4.1).

use std::sync::Arc;

use crate::model::{Elmnt, ElmntKind, File};

/// Tokenization mode: composable flags selecting the base unit (`BY_LINE`
/// xor `BY_WORD`) and two modifiers (`IGNORE_BLANKS`, `WHOLE_WORD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMode(u8);

impl TokenMode {
    pub const BY_LINE: Self = Self(1 << 0);
    pub const BY_WORD: Self = Self(1 << 1);
    pub const IGNORE_BLANKS: Self = Self(1 << 2);
    pub const WHOLE_WORD: Self = Self(1 << 3);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    const fn by_line(self) -> bool {
        self.contains(Self::BY_LINE)
    }

    #[must_use]
    const fn ignore_blanks(self) -> bool {
        self.contains(Self::IGNORE_BLANKS)
    }

    #[must_use]
    const fn whole_word(self) -> bool {
        self.contains(Self::WHOLE_WORD)
    }
}

impl std::ops::BitOr for TokenMode {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

const MARKER_LEN: usize = 20;

/// Stable 32-bit content hash (DJB2a, XOR variant) — the same scheme used
/// by real diff engines for fast line/word comparison.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 5381;
    for &b in bytes {
        hash = hash.wrapping_mul(33) ^ u32::from(b);
    }
    hash
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_blank_byte(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Parse a 20-byte chunk marker starting at `pos`: `0x00`, 17 ASCII bytes
/// of `"%5d %5d %5d"`, `\n`, `0x00` (spec.md §3, §6).
fn parse_marker(bytes: &[u8], pos: usize) -> Option<(u32, u32, u32)> {
    if bytes.len() - pos < MARKER_LEN {
        return None;
    }
    let body = &bytes[pos + 1..pos + 18];
    if bytes[pos + 18] != b'\n' {
        return None;
    }
    let text = std::str::from_utf8(body).ok()?;
    let mut fields = [0u32; 3];
    for (slot, part) in fields.iter_mut().zip([&text[0..5], &text[6..11], &text[12..17]]) {
        *slot = part.trim().parse().ok()?;
    }
    Some((fields[0], fields[1], fields[2]))
}

/// One span produced by the scanner, before it is turned into an [`Elmnt`].
struct Span {
    start: usize,
    len: usize,
    prefix: usize,
    plen: usize,
    kind: ElmntKind,
}

struct Scanner<'a> {
    bytes: &'a [u8],
    mode: TokenMode,
    pos: usize,
    sol: bool,
}

impl<'a> Scanner<'a> {
    fn new(bytes: &'a [u8], mode: TokenMode) -> Self {
        Self { bytes, mode, pos: 0, sol: true }
    }

    /// Consume a maximal run of spaces/tabs starting at `from`.
    fn scan_blanks(&self, from: usize) -> usize {
        let mut i = from;
        while i < self.bytes.len() && is_blank_byte(self.bytes[i]) {
            i += 1;
        }
        i
    }

    /// If `IgnoreBlanks` applies at start-of-line, repeatedly skip entirely
    /// blank lines (a run of spaces/tabs — possibly empty — followed by a
    /// newline), then consume any remaining leading whitespace of the
    /// first non-blank line. Returns the total number of bytes consumed
    /// this way, to be attached as the next core token's `prefix` (or, if
    /// consumption runs to EOF, returned to the caller to become its own
    /// trailing element).
    fn consume_leading_blanks(&mut self) -> usize {
        if !self.mode.ignore_blanks() || !self.sol {
            return 0;
        }
        let start = self.pos;
        loop {
            let ws_end = self.scan_blanks(self.pos);
            if ws_end < self.bytes.len() && self.bytes[ws_end] == b'\n' {
                self.pos = ws_end + 1;
                continue;
            }
            self.pos = ws_end;
            break;
        }
        self.pos - start
    }

    /// Extend `end` (currently just past the core token) to absorb a
    /// *non-empty* trailing whitespace run immediately followed by a
    /// newline, per `IgnoreBlanks`'s `plen` extension. A newline with no
    /// intervening whitespace is left as its own line-ender element.
    fn trailing_extension(&self, end: usize) -> usize {
        if !self.mode.ignore_blanks() {
            return 0;
        }
        let ws_end = self.scan_blanks(end);
        if ws_end > end && ws_end < self.bytes.len() && self.bytes[ws_end] == b'\n' {
            ws_end + 1 - end
        } else {
            0
        }
    }

    fn scan_core_end(&self, start: usize) -> usize {
        let n = self.bytes.len();
        if start >= n {
            return start;
        }
        if self.mode.by_line() {
            let mut i = start;
            while i < n && self.bytes[i] != b'\n' {
                i += 1;
            }
            return if i < n { i + 1 } else { i };
        }
        if self.mode.whole_word() {
            let mut i = start;
            while i < n && !is_blank_byte(self.bytes[i]) && self.bytes[i] != b'\n' {
                i += 1;
            }
            if i == start {
                i + 1
            } else {
                i
            }
        } else if is_word_byte(self.bytes[start]) {
            let mut i = start;
            while i < n && is_word_byte(self.bytes[i]) {
                i += 1;
            }
            i
        } else if is_blank_byte(self.bytes[start]) {
            let mut i = start;
            while i < n && is_blank_byte(self.bytes[i]) {
                i += 1;
            }
            i
        } else {
            start + 1
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        if self.pos >= self.bytes.len() {
            return None;
        }

        if self.bytes[self.pos] == 0 {
            if let Some((chunk, line, count)) = parse_marker(self.bytes, self.pos) {
                let start = self.pos;
                self.pos += MARKER_LEN;
                self.sol = true;
                return Some(Span {
                    start,
                    len: MARKER_LEN,
                    prefix: 0,
                    plen: 0,
                    kind: ElmntKind::ChunkMarker { chunk, line, count },
                });
            }
        }

        let prefix = self.consume_leading_blanks();

        if self.pos >= self.bytes.len() {
            // Leading whitespace (one or more blank lines, or a trailing
            // partial line) ran to EOF with nothing left to attach it to:
            // it becomes its own trailing element.
            let start = self.pos - prefix;
            self.sol = false;
            return Some(Span { start, len: prefix, prefix: 0, plen: 0, kind: ElmntKind::Normal });
        }

        let start = self.pos;
        let core_end = self.scan_core_end(start);
        let plen = self.trailing_extension(core_end);
        let end = core_end + plen;

        self.sol = end > 0 && self.bytes[end - 1] == b'\n';
        self.pos = end;

        Some(Span { start, len: core_end - start, prefix, plen, kind: ElmntKind::Normal })
    }
}

/// Tokenize `bytes` under `mode`, producing a [`File`] whose elements tile
/// the buffer exactly (spec.md §4.1).
///
/// Implemented as two passes over the same scanner — a counting pass to
/// size the output vector exactly, then a filling pass — per spec.md's
/// "two passes … element count is exact."
#[must_use]
pub fn split_stream(bytes: &[u8], mode: TokenMode) -> File {
    let count = Scanner::new(bytes, mode).count();
    let mut elements = Vec::with_capacity(count);
    for span in Scanner::new(bytes, mode) {
        elements.push(Elmnt {
            start: span.start,
            len: span.len,
            plen: span.plen,
            prefix: span.prefix,
            hash: match span.kind {
                ElmntKind::ChunkMarker { chunk, .. } => chunk,
                ElmntKind::Normal => content_hash(&bytes[span.start..span.start + span.len]),
            },
            kind: span.kind,
        });
    }
    File::new(Arc::from(bytes), elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(file: &File) -> Vec<u8> {
        let buf = file.bytes();
        let mut out = Vec::new();
        for e in file.elements() {
            out.extend_from_slice(e.prefix_bytes(buf));
            out.extend_from_slice(e.full(buf));
        }
        out
    }

    #[test]
    fn empty_input_yields_zero_elements() {
        let file = split_stream(b"", TokenMode::BY_WORD);
        assert!(file.is_empty());
    }

    #[test]
    fn round_trip_by_word() {
        let src = b"hello, world!\nsecond line\n";
        let file = split_stream(src, TokenMode::BY_WORD);
        assert_eq!(reconstruct(&file), src);
    }

    #[test]
    fn round_trip_by_line() {
        let src = b"a\nb\nc";
        let file = split_stream(src, TokenMode::BY_LINE);
        assert_eq!(reconstruct(&file), src);
    }

    #[test]
    fn round_trip_whole_word() {
        let src = b"foo.bar baz\tqux\n";
        let file = split_stream(src, TokenMode::WHOLE_WORD | TokenMode::BY_WORD);
        assert_eq!(reconstruct(&file), src);
    }

    #[test]
    fn round_trip_ignore_blanks() {
        let src = b"  hello   world  \n\n   \nlast\n";
        let file = split_stream(src, TokenMode::BY_WORD | TokenMode::IGNORE_BLANKS);
        assert_eq!(reconstruct(&file), src);
    }

    #[test]
    fn by_line_splits_on_newlines() {
        let file = split_stream(b"a\nb\nc\n", TokenMode::BY_LINE);
        assert_eq!(file.len(), 3);
        assert_eq!(file.element(0).core(file.bytes()), b"a\n");
    }

    #[test]
    fn by_word_splits_words_whitespace_and_punctuation() {
        let file = split_stream(b"foo bar.\n", TokenMode::BY_WORD);
        let cores: Vec<&[u8]> = file.elements().iter().map(|e| e.core(file.bytes())).collect();
        assert_eq!(cores, vec![b"foo".as_slice(), b" ", b"bar", b".", b"\n"]);
    }

    #[test]
    fn whole_word_merges_punctuation_into_one_word() {
        let file = split_stream(b"foo.bar baz\n", TokenMode::BY_WORD | TokenMode::WHOLE_WORD);
        let cores: Vec<&[u8]> = file.elements().iter().map(|e| e.core(file.bytes())).collect();
        assert_eq!(cores, vec![b"foo.bar".as_slice(), b" ", b"baz", b"\n"]);
    }

    #[test]
    fn ignore_blanks_skips_entirely_blank_lines() {
        let file = split_stream(b"a\n\nb\n", TokenMode::BY_WORD | TokenMode::IGNORE_BLANKS);
        let cores: Vec<&[u8]> = file.elements().iter().map(|e| e.core(file.bytes())).collect();
        assert_eq!(cores, vec![b"a".as_slice(), b"\n", b"b", b"\n"]);
    }

    #[test]
    fn chunk_marker_detected_and_consumes_twenty_bytes() {
        let mut buf = vec![0u8; 20];
        buf[0] = 0;
        let header = b"    1     2     3";
        assert_eq!(header.len(), 17);
        buf[1..18].copy_from_slice(header);
        buf[18] = b'\n';
        buf[19] = 0;
        buf.extend_from_slice(b"after\n");
        let file = split_stream(&buf, TokenMode::BY_WORD);
        assert!(file.element(0).is_chunk_marker());
        assert_eq!(file.element(0).chunk_index(), Some(1));
        assert_eq!(file.element(0).len, MARKER_LEN);
    }

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash(b"hello"), content_hash(b"hello"));
        assert_ne!(content_hash(b"hello"), content_hash(b"world"));
    }
}
