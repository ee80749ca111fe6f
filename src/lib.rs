//! wiggle — word-granularity three-way merge and patch-wiggling engine.
//!
//! This crate is the algorithmic core described by spec.md: a tokenizer, an
//! LCS differ, a multi-hunk patch locator, a three-way merger, a conflict
//! isolator, and a conflict-marker emitter. It performs no I/O and installs
//! no logging subscriber — both are the `wiggle-cli` binary's job.

pub mod bestmatch;
pub mod config;
pub mod differ;
pub mod emit;
pub mod error;
pub mod extractor;
pub mod isolate;
pub mod merger;
pub mod model;
pub mod tokenizer;

pub use bestmatch::pdiff;
pub use config::{ConfigError, MergeConfig, MergeOptions, OutputConfig, WiggleCliConfig};
pub use differ::{diff, diff_partial};
pub use emit::{print_merge, MergeStats};
pub use error::WiggleError;
pub use extractor::{split_merge as extract_merge, split_patch as extract_patch, ExtractedMerge, ExtractedPatch};
pub use isolate::isolate_conflicts;
pub use merger::{make_merger, MergeResult};
pub use model::{Csl, CslEntry, Elmnt, ElmntKind, File, MergeSegment, SegmentType, ThreeWayFiles};
pub use tokenizer::{split_stream as tokenize, TokenMode};

/// If `before`'s element stream carries chunk markers (i.e. it was
/// produced by [`extract_patch`] rather than plain tokenization), returns
/// the highest chunk index present — the count `pdiff` needs to place
/// every hunk. Otherwise `None`, meaning csl1 should use plain [`diff`].
fn before_chunk_count(before: &File) -> Option<u32> {
    before.elements().iter().filter_map(Elmnt::chunk_index).max()
}

/// Run the full data flow of spec.md §2 over already-tokenized files:
/// compute csl1 (using [`pdiff`] if `before` carries chunk markers,
/// [`diff`] otherwise), csl2, merge, isolate, and emit into an in-memory
/// buffer.
fn run_pipeline(file_m: &File, file_b: &File, file_a: &File, options: &MergeOptions) -> (Vec<u8>, MergeStats) {
    let csl1 = match before_chunk_count(file_b) {
        Some(chunks) => {
            tracing::debug!(chunks, "computing csl1 with pdiff (chunk-marked before stream)");
            pdiff(file_m, file_b, chunks)
        }
        None => {
            tracing::debug!("computing csl1 with plain diff");
            diff(file_m, file_b)
        }
    };
    let csl2 = diff(file_b, file_a);
    tracing::debug!(
        m = file_m.len(),
        b = file_b.len(),
        a = file_a.len(),
        csl1 = csl1.entries().len(),
        csl2 = csl2.entries().len(),
        "tokenized files and computed both CSLs"
    );

    let merged = make_merger(file_m, file_b, file_a, &csl1, &csl2, options);
    tracing::debug!(segments = merged.segments.len(), wiggles = merged.wiggles, ignored = merged.ignored, "merger produced segment list");

    let mut segments = merged.segments;
    let files = ThreeWayFiles::new(file_m.clone(), file_b.clone(), file_a.clone());
    let conflicts = isolate_conflicts(&files, &mut segments, options.show_wiggles, options.words);

    let mut out = Vec::new();
    let stats = print_merge(&mut out, &files, &segments, conflicts, merged.wiggles, merged.ignored, options)
        .expect("writing to an in-memory Vec<u8> cannot fail");
    tracing::debug!(conflicts = stats.conflicts, wiggles = stats.wiggles, ignored = stats.ignored, "emitted merge result");
    (out, stats)
}

/// Three-way merge `before`/`after` (two independent edits of `original`)
/// into conflict-marker text, running the complete pipeline of spec.md §2
/// in one call. This is the entry point `wiggle diff3` uses.
///
/// # Errors
/// None today — reserved for parity with [`apply_patch`]'s signature and
/// any future input validation.
pub fn merge_files(original: &[u8], before: &[u8], after: &[u8], options: &MergeOptions) -> Result<(Vec<u8>, MergeStats), WiggleError> {
    let mode = if options.words { TokenMode::BY_WORD } else { TokenMode::BY_LINE };
    let file_m = tokenize(original, mode);
    let file_b = tokenize(before, mode);
    let file_a = tokenize(after, mode);
    Ok(run_pipeline(&file_m, &file_b, &file_a, options))
}

/// Apply a unified/context `patch` to `original`, wiggling its hunks into
/// place with [`pdiff`] and merging the result. This is the entry point
/// `wiggle patch` uses.
///
/// # Errors
/// Returns [`WiggleError::MalformedPatch`] if `patch` cannot be parsed.
pub fn apply_patch(original: &[u8], patch: &[u8], options: &MergeOptions) -> Result<(Vec<u8>, MergeStats), WiggleError> {
    let extracted = extract_patch(patch)?;
    let mode = if options.words { TokenMode::BY_WORD } else { TokenMode::BY_LINE };
    let file_m = tokenize(original, mode);
    let file_b = tokenize(&extracted.before, mode);
    let file_a = tokenize(&extracted.after, mode);
    Ok(run_pipeline(&file_m, &file_b, &file_a, options))
}
