//! Split a patch or a three-way merge blob into element streams (spec.md
//! §4.2).
//!
//! Both `split_patch` and `split_merge` return raw byte buffers; the caller
//! tokenizes them with [`crate::tokenizer::split_stream`] to get [`File`]s.

use crate::error::WiggleError;

/// 20-byte in-band chunk marker: `0x00`, 17 ASCII bytes of
/// `"%5d %5d %5d"`, `\n`, `0x00` (spec.md §3/§6).
fn make_marker(chunk: u32, line: u32, count: u32) -> [u8; 20] {
    let mut buf = [0u8; 20];
    let body = format!("{chunk:>5} {line:>5} {count:>5}");
    debug_assert_eq!(body.len(), 17, "marker body must be exactly 17 bytes, got {body:?}");
    buf[1..18].copy_from_slice(body.as_bytes());
    buf[18] = b'\n';
    buf
}

/// The result of [`split_patch`]: the hunk count plus the "before" and
/// "after" byte streams, each with a chunk marker at the start of every
/// hunk.
#[derive(Debug, Clone, Default)]
pub struct ExtractedPatch {
    pub chunks: u32,
    pub before: Vec<u8>,
    pub after: Vec<u8>,
}

/// The result of [`split_merge`]: the three tokenizable streams recovered
/// from a conflict-marked file.
#[derive(Debug, Clone, Default)]
pub struct ExtractedMerge {
    pub m: Vec<u8>,
    pub b: Vec<u8>,
    pub a: Vec<u8>,
}

/// Split `bytes` into lines, each slice including its trailing `\n` (the
/// final line may lack one).
fn split_lines_keep_ending(bytes: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 0..bytes.len() {
        if bytes[i] == b'\n' {
            out.push(&bytes[start..=i]);
            start = i + 1;
        }
    }
    if start < bytes.len() {
        out.push(&bytes[start..]);
    }
    out
}

fn line_text(line: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(line.strip_suffix(b"\n").unwrap_or(line))
}

fn parse_range(s: &str) -> Option<(u32, u32)> {
    if let Some((a, b)) = s.split_once(',') { Some((a.parse().ok()?, b.parse().ok()?)) } else { Some((s.parse().ok()?, 1)) }
}

/// `@@ -A,B +C,D @@ ...trailing context...`
fn parse_unified_header(line: &str) -> Option<(u32, u32, u32, u32)> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "@@" {
        return None;
    }
    let minus = parts.next()?.strip_prefix('-')?;
    let plus = parts.next()?.strip_prefix('+')?;
    let (a, b) = parse_range(minus)?;
    let (c, d) = parse_range(plus)?;
    Some((a, b, c, d))
}

/// `*** A,B ****` or `--- C,D ----`
fn parse_context_header(line: &str, prefix: &str, suffix_marker: &str) -> Option<(u32, u32)> {
    let rest = line.strip_prefix(prefix)?.trim();
    let nums = rest.split_whitespace().next()?;
    if !rest.contains(suffix_marker) {
        return None;
    }
    parse_range(nums)
}

/// Parse unified-diff and context-diff hunks out of `bytes` (spec.md §4.2,
/// §6). File-header lines (`---`/`+++`, `diff --git`, `Index:`, …) outside a
/// hunk are skipped.
///
/// # Errors
/// Returns [`WiggleError::MalformedPatch`] when a hunk's body ends before
/// its header's declared line counts are satisfied.
pub fn split_patch(bytes: &[u8]) -> Result<ExtractedPatch, WiggleError> {
    let lines = split_lines_keep_ending(bytes);
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut chunk: u32 = 0;
    let mut i = 0;

    while i < lines.len() {
        let text = line_text(lines[i]);

        if let Some((a, b, c, d)) = parse_unified_header(&text) {
            chunk += 1;
            before.extend_from_slice(&make_marker(chunk, a, b));
            after.extend_from_slice(&make_marker(chunk, c, d));
            i += 1;
            consume_unified_body(&lines, &mut i, b, d, &mut before, &mut after)?;
            continue;
        }

        if let Some((a, b)) = parse_context_header(&text, "*** ", "****") {
            chunk += 1;
            i += 1;
            let mut before_body = Vec::new();
            consume_context_section(&lines, &mut i, b, &[b' ', b'!', b'-'], &mut before_body)?;

            let after_text = if i < lines.len() { line_text(lines[i]) } else { std::borrow::Cow::Borrowed("") };
            let Some((c, d)) = parse_context_header(&after_text, "--- ", "----") else {
                return Err(WiggleError::MalformedPatch { line: i + 1, reason: "expected '--- C,D ----' after context hunk's before-section".to_owned() });
            };
            before.extend_from_slice(&make_marker(chunk, a, b));
            after.extend_from_slice(&make_marker(chunk, c, d));
            before.extend_from_slice(&before_body);
            i += 1;
            consume_context_section(&lines, &mut i, d, &[b' ', b'!', b'+'], &mut after)?;
            continue;
        }

        i += 1;
    }

    Ok(ExtractedPatch { chunks: chunk, before, after })
}

fn consume_unified_body(
    lines: &[&[u8]],
    i: &mut usize,
    mut bcnt: u32,
    mut acnt: u32,
    before: &mut Vec<u8>,
    after: &mut Vec<u8>,
) -> Result<(), WiggleError> {
    while bcnt > 0 || acnt > 0 {
        let Some(&line) = lines.get(*i) else {
            return Err(WiggleError::MalformedPatch { line: *i + 1, reason: "unterminated hunk: body ended before context/add/remove counts were satisfied".to_owned() });
        };
        let Some(&tag) = line.first() else {
            return Err(WiggleError::MalformedPatch { line: *i + 1, reason: "empty line inside hunk body".to_owned() });
        };
        let rest = &line[1..];
        match tag {
            b' ' => {
                before.extend_from_slice(rest);
                after.extend_from_slice(rest);
                bcnt = bcnt.saturating_sub(1);
                acnt = acnt.saturating_sub(1);
            }
            b'-' => {
                before.extend_from_slice(rest);
                bcnt = bcnt.saturating_sub(1);
            }
            b'+' => {
                after.extend_from_slice(rest);
                acnt = acnt.saturating_sub(1);
            }
            b'\\' => {} // "\ No newline at end of file" — not counted
            _ => {
                return Err(WiggleError::MalformedPatch {
                    line: *i + 1,
                    reason: format!("unexpected hunk body prefix {:?}", tag as char),
                });
            }
        }
        *i += 1;
    }
    Ok(())
}

fn consume_context_section(
    lines: &[&[u8]],
    i: &mut usize,
    mut remaining: u32,
    allowed: &[u8],
    out: &mut Vec<u8>,
) -> Result<(), WiggleError> {
    while remaining > 0 {
        let Some(&line) = lines.get(*i) else {
            return Err(WiggleError::MalformedPatch { line: *i + 1, reason: "unterminated context hunk section".to_owned() });
        };
        let Some(&tag) = line.first() else {
            return Err(WiggleError::MalformedPatch { line: *i + 1, reason: "empty line inside context hunk section".to_owned() });
        };
        if !allowed.contains(&tag) {
            return Err(WiggleError::MalformedPatch { line: *i + 1, reason: format!("unexpected context hunk line prefix {:?}", tag as char) });
        }
        out.extend_from_slice(&line[1..]);
        remaining -= 1;
        *i += 1;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeState {
    NotInConflict,
    Section1,
    Section2,
    Section3,
}

fn is_marker(line: &[u8], marker: &[u8]) -> bool {
    line.starts_with(marker) && (line.len() == marker.len() || matches!(line[marker.len()], b' ' | b'\n'))
}

/// Parse a diff3-style conflict-marked file into its three constituent
/// streams (spec.md §4.2, §6). Supports both 3-way conflicts
/// (`<<<<<<<`/`|||||||`/`=======`/`>>>>>>>`) and 2-way conflicts that omit
/// the `|||||||` base section.
///
/// Section assignment mirrors the Emitter's own ordering (spec.md §4.7):
/// the text between `<<<<<<<` and `|||||||` is the "original" (`m`)
/// stream, the text between `|||||||` and `=======` is the "before" (`b`)
/// stream, and the text between `=======` and `>>>>>>>` is the "after"
/// (`a`) stream — so parsing the Emitter's own output round-trips.
///
/// For a 2-way conflict, section 1's text (between `<<<<<<<` and
/// `=======`) is used for both the "before" stream and, since no base is
/// shown, the "original" stream — matching the conservative reading that
/// an omitted base means "assume it matched one side."
///
/// # Errors
/// Returns [`WiggleError::MalformedMerge`] on an out-of-order marker or a
/// conflict left open at EOF.
pub fn split_merge(bytes: &[u8]) -> Result<ExtractedMerge, WiggleError> {
    let lines = split_lines_keep_ending(bytes);
    let mut m = Vec::new();
    let mut b = Vec::new();
    let mut a = Vec::new();
    let mut state = MergeState::NotInConflict;
    let mut section1_buf: Vec<u8> = Vec::new();

    for (idx, &line) in lines.iter().enumerate() {
        let lineno = idx + 1;
        if is_marker(line, b"<<<<<<<") {
            if state != MergeState::NotInConflict {
                return Err(WiggleError::MalformedMerge { line: lineno, reason: "nested '<<<<<<<' before previous conflict closed".to_owned() });
            }
            state = MergeState::Section1;
            section1_buf.clear();
            continue;
        }
        if is_marker(line, b"|||||||") {
            if state != MergeState::Section1 {
                return Err(WiggleError::MalformedMerge { line: lineno, reason: "'|||||||' without a preceding '<<<<<<<'".to_owned() });
            }
            m.extend_from_slice(&section1_buf);
            section1_buf.clear();
            state = MergeState::Section2;
            continue;
        }
        if is_marker(line, b"=======") {
            match state {
                MergeState::Section1 => {
                    // 2-way conflict: no base was shown.
                    b.extend_from_slice(&section1_buf);
                    m.extend_from_slice(&section1_buf);
                    section1_buf.clear();
                }
                MergeState::Section2 => {}
                MergeState::NotInConflict | MergeState::Section3 => {
                    return Err(WiggleError::MalformedMerge { line: lineno, reason: "'=======' without a preceding '<<<<<<<'".to_owned() });
                }
            }
            state = MergeState::Section3;
            continue;
        }
        if is_marker(line, b">>>>>>>") {
            if state != MergeState::Section3 {
                return Err(WiggleError::MalformedMerge { line: lineno, reason: "'>>>>>>>' without a preceding '======='".to_owned() });
            }
            state = MergeState::NotInConflict;
            continue;
        }

        match state {
            MergeState::NotInConflict => {
                m.extend_from_slice(line);
                b.extend_from_slice(line);
                a.extend_from_slice(line);
            }
            MergeState::Section1 => section1_buf.extend_from_slice(line),
            MergeState::Section2 => b.extend_from_slice(line),
            MergeState::Section3 => a.extend_from_slice(line),
        }
    }

    if state != MergeState::NotInConflict {
        return Err(WiggleError::MalformedMerge { line: lines.len(), reason: "conflict left open at end of file".to_owned() });
    }

    Ok(ExtractedMerge { m, b, a })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_patch_unified_single_hunk() {
        let patch = b"--- a\n+++ b\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n";
        let extracted = split_patch(patch).unwrap();
        assert_eq!(extracted.chunks, 1);
        assert!(extracted.before.ends_with(b"a\nb\nc\n"));
        assert!(extracted.after.ends_with(b"a\nB\nc\n"));
        // chunk marker present at the start of both streams
        assert_eq!(extracted.before[0], 0);
        assert_eq!(extracted.after[0], 0);
    }

    #[test]
    fn split_patch_two_hunks_increments_chunk_index() {
        let patch = b"@@ -1,1 +1,1 @@\n-a\n+A\n@@ -10,1 +10,1 @@\n-z\n+Z\n";
        let extracted = split_patch(patch).unwrap();
        assert_eq!(extracted.chunks, 2);
    }

    #[test]
    fn split_patch_default_count_is_one() {
        let patch = b"@@ -5 +5 @@\n-x\n+y\n";
        let extracted = split_patch(patch).unwrap();
        assert_eq!(extracted.chunks, 1);
        assert!(extracted.before.ends_with(b"x\n"));
        assert!(extracted.after.ends_with(b"y\n"));
    }

    #[test]
    fn split_patch_unterminated_hunk_is_malformed() {
        let patch = b"@@ -1,3 +1,3 @@\n a\n-b\n";
        let err = split_patch(patch).unwrap_err();
        assert!(matches!(err, WiggleError::MalformedPatch { .. }));
    }

    #[test]
    fn split_patch_context_format() {
        let patch = b"*** 1,3 ****\n a\n! b\n c\n--- 1,3 ----\n a\n! B\n c\n";
        let extracted = split_patch(patch).unwrap();
        assert_eq!(extracted.chunks, 1);
        assert!(extracted.before.ends_with(b"a\nb\nc\n"));
        assert!(extracted.after.ends_with(b"a\nB\nc\n"));
    }

    #[test]
    fn split_merge_three_way_conflict() {
        // Section assignment mirrors the Emitter's own ordering: the
        // <<<<<<</||||||| section is "original" (m), the |||||||/=======
        // section is "before" (b), and the =======/>>>>>>> section is
        // "after" (a).
        let text = b"a\n<<<<<<< ours\nB\n||||||| base\nb\n=======\nQ\n>>>>>>> theirs\nc\n";
        let extracted = split_merge(text).unwrap();
        assert_eq!(extracted.m, b"a\nB\nc\n");
        assert_eq!(extracted.b, b"a\nb\nc\n");
        assert_eq!(extracted.a, b"a\nQ\nc\n");
    }

    #[test]
    fn split_merge_two_way_conflict_uses_ours_as_base() {
        let text = b"a\n<<<<<<<\nB\n=======\nQ\n>>>>>>>\nc\n";
        let extracted = split_merge(text).unwrap();
        assert_eq!(extracted.m, b"a\nB\nc\n");
        assert_eq!(extracted.b, b"a\nB\nc\n");
        assert_eq!(extracted.a, b"a\nQ\nc\n");
    }

    #[test]
    fn split_merge_unterminated_conflict_is_malformed() {
        let text = b"<<<<<<<\nB\n=======\nQ\n";
        let err = split_merge(text).unwrap_err();
        assert!(matches!(err, WiggleError::MalformedMerge { .. }));
    }

    #[test]
    fn split_merge_stray_closer_is_malformed() {
        let text = b"a\n>>>>>>>\n";
        let err = split_merge(text).unwrap_err();
        assert!(matches!(err, WiggleError::MalformedMerge { .. }));
    }

    #[test]
    fn split_merge_no_conflict_copies_to_all_three() {
        let text = b"a\nb\nc\n";
        let extracted = split_merge(text).unwrap();
        assert_eq!(extracted.m, extracted.b);
        assert_eq!(extracted.b, extracted.a);
    }
}
