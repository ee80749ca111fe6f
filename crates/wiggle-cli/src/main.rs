//! `wiggle` — thin CLI driver over the `wiggle` library.
//!
//! Parses argv, reads the input files, calls one of the library's pipeline
//! entry points, writes the result to stdout, and maps the resulting
//! `MergeStats` to an exit code. Holds no merge logic of its own.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wiggle::{MergeOptions, MergeStats, WiggleCliConfig};

#[derive(Parser)]
#[command(name = "wiggle", about = "word-granularity three-way merge and patch-wiggling engine")]
struct Cli {
    /// Path to a `wiggle.toml` config file overriding built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Word-granularity conflicts instead of line-granularity.
    #[arg(long, global = true)]
    words: bool,

    /// Narrow conflict regions to the smallest alignment and show the
    /// wiggled-result block alongside true conflicts.
    #[arg(long, global = true)]
    show_wiggles: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Three-way merge of `before`/`after`, two independent edits of `original`.
    Diff3 { original: PathBuf, before: PathBuf, after: PathBuf },
    /// Apply a unified/context diff `patchfile` to `original`, wiggling hunks into place.
    Patch { original: PathBuf, patchfile: PathBuf },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn resolve_options(cli: &Cli) -> anyhow::Result<MergeOptions> {
    let config = match &cli.config {
        Some(path) => WiggleCliConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => WiggleCliConfig::default(),
    };
    let mut options = config.merge.to_options();
    options.words |= cli.words;
    options.show_wiggles |= cli.show_wiggles;
    Ok(options)
}

fn exit_code(stats: MergeStats) -> ExitCode {
    if stats.conflicts > 0 {
        ExitCode::from(1)
    } else if stats.wiggles > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: &Cli) -> anyhow::Result<(Vec<u8>, MergeStats)> {
    let options = resolve_options(cli)?;
    match &cli.command {
        Command::Diff3 { original, before, after } => {
            let m = std::fs::read(original).with_context(|| format!("reading {}", original.display()))?;
            let b = std::fs::read(before).with_context(|| format!("reading {}", before.display()))?;
            let a = std::fs::read(after).with_context(|| format!("reading {}", after.display()))?;
            Ok(wiggle::merge_files(&m, &b, &a, &options)?)
        }
        Command::Patch { original, patchfile } => {
            let m = std::fs::read(original).with_context(|| format!("reading {}", original.display()))?;
            let patch = std::fs::read(patchfile).with_context(|| format!("reading {}", patchfile.display()))?;
            Ok(wiggle::apply_patch(&m, &patch, &options)?)
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok((out, stats)) => {
            use std::io::Write as _;
            if let Err(e) = std::io::stdout().write_all(&out) {
                eprintln!("error writing output: {e}");
                return ExitCode::FAILURE;
            }
            tracing::debug!(conflicts = stats.conflicts, wiggles = stats.wiggles, ignored = stats.ignored, "merge complete");
            exit_code(stats)
        }
        Err(e) => {
            eprintln!("wiggle: {e:#}");
            ExitCode::FAILURE
        }
    }
}
