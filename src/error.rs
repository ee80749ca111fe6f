//! Error types for the wiggle merge engine (spec.md §7).
//!
//! Hand-rolled rather than derived: the Extractor and Tokenizer are the only
//! components that can fail at runtime (malformed patch/merge input); the
//! Differ, BestMatch, Merger, Isolator, and Emitter are total and never
//! return `Result` — their preconditions are established upstream or are
//! programming errors (`assert!`/`unreachable!`), per spec.md §7/§9.

use std::fmt;

/// Unified error type for the library's fallible entry points.
#[derive(Debug)]
pub enum WiggleError {
    /// The patch stream was malformed: an unterminated hunk, a bad context
    /// marker, or a body whose line count disagrees with its header.
    MalformedPatch {
        /// 1-based line number in the patch text where parsing failed.
        line: usize,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// The three-way merge text was malformed: an unrecognized or
    /// misordered `<<<<<<<`/`|||||||`/`=======`/`>>>>>>>` sequence.
    MalformedMerge {
        /// 1-based line number where parsing failed.
        line: usize,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// An I/O error, surfaced only by the CLI crate's file loading — the
    /// library's pure functions never perform I/O themselves, but the CLI
    /// wants to propagate file errors through the same `Result` type.
    Io(std::io::Error),
}

impl fmt::Display for WiggleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPatch { line, reason } => {
                write!(f, "malformed patch at line {line}: {reason}")
            }
            Self::MalformedMerge { line, reason } => {
                write!(f, "malformed merge file at line {line}: {reason}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for WiggleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::MalformedPatch { .. } | Self::MalformedMerge { .. } => None,
        }
    }
}

impl From<std::io::Error> for WiggleError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
