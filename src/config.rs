//! Merge configuration (SPEC_FULL.md §10).
//!
//! `MergeOptions` is the library's entire in-process configuration surface —
//! it is threaded explicitly through every public pipeline entry point,
//! never read from a file by the library itself. `WiggleCliConfig` is the
//! CLI crate's on-disk presentation-defaults file; it only ever sets the
//! `MergeOptions` the CLI passes in.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

/// Behavior flags threaded through `make_merger`/`isolate_conflicts`/
/// `print_merge` (spec.md §4.5–§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Word-granularity conflict narrowing (spec.md §4.6/§4.7 "words mode").
    pub words: bool,
    /// Detect `AlreadyApplied` segments instead of reporting a conflict
    /// when `file_m` already equals `file_a` over the patched range.
    pub ignore_already: bool,
    /// Treat wiggles (successfully-placed-but-drifted hunks) as conflicts
    /// for isolation purposes, and emit the `&&&` wiggled-result block.
    pub show_wiggles: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self { words: false, ignore_already: true, show_wiggles: false }
    }
}

/// The CLI's on-disk configuration file (`wiggle.toml`), following the root
/// crate's `ManifoldConfig` pattern: `#[serde(deny_unknown_fields)]` on every
/// nested struct, a `load()`/`parse()` split, and a missing file meaning
/// "use defaults", not an error.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct WiggleCliConfig {
    /// Default merge behavior flags, overridable per-invocation by CLI args.
    #[serde(default)]
    pub merge: MergeConfig,
    /// Presentation settings the library itself has no opinion about.
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    #[serde(default)]
    pub words: bool,
    #[serde(default = "default_true")]
    pub ignore_already: bool,
    #[serde(default)]
    pub show_wiggles: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { words: false, ignore_already: true, show_wiggles: false }
    }
}

impl MergeConfig {
    #[must_use]
    pub const fn to_options(&self) -> MergeOptions {
        MergeOptions {
            words: self.words,
            ignore_already: self.ignore_already,
            show_wiggles: self.show_wiggles,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Colorize conflict markers when writing to a terminal.
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Error loading or parsing a `WiggleCliConfig` file.
#[derive(Debug)]
pub struct ConfigError {
    pub path: Option<std::path::PathBuf>,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl WiggleCliConfig {
    /// Load configuration from a TOML file. A missing file yields
    /// `Self::default()`, not an error.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse
    /// errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields, with a line
    /// number computed from the parser's byte span.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start].chars().filter(|&c| c == '\n').count() + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError { path: None, message }
        })
    }
}
