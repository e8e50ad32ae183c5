//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Audit a ROM folder and print the KEEP/REMOVE log
//! romdedupe scan ~/roms
//!
//! # Machine-readable report
//! romdedupe scan ~/roms --output json > report.json
//!
//! # Extra extensions, no persisted cache
//! romdedupe scan ~/roms --extensions rom,bin2 --no-cache
//!
//! # Inspect how filenames are parsed
//! romdedupe parse "Final Fantasy VII (USA) (Disc 1).bin"
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Region-aware duplicate ROM finder.
///
/// Groups regional releases, revisions and editions of the same game and
/// lists the files that are safe to remove, never splitting a multi-disc set.
#[derive(Debug, Parser)]
#[command(name = "romdedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Named profile from the configuration file
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory and list redundant ROM files
    Scan(ScanArgs),
    /// Show how filenames are parsed
    Parse(ParseArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Worker threads (default: 4)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Extra ROM extensions, comma-separated (e.g. rom,bin2)
    #[arg(long, value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Directory names to skip (replaces the configured list)
    #[arg(long = "skip-dir", value_name = "NAME")]
    pub skip_dirs: Vec<String>,

    /// Follow symbolic links during scan
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Include hidden files and directories (starting with .)
    #[arg(long)]
    pub include_hidden: bool,

    /// Resolver cache file
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Do not load or save the resolver cache
    #[arg(long, conflicts_with = "cache")]
    pub no_cache: bool,

    /// Discard the persisted resolver cache before scanning
    #[arg(long)]
    pub clear_cache: bool,

    /// Disable the built-in regional title table
    #[arg(long)]
    pub no_local_mappings: bool,

    /// Keep Japan releases when Europe but no USA release is present
    #[arg(long)]
    pub keep_japan_with_europe: bool,

    /// List single-member buckets in the text log
    #[arg(long)]
    pub show_all: bool,

    /// Log throttled progress messages instead of drawing progress bars
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the parse subcommand.
#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Filenames to parse
    #[arg(value_name = "FILENAME", required = true)]
    pub filenames: Vec<String>,

    /// Print one JSON object per line
    #[arg(long)]
    pub json: bool,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// KEEP/REMOVE audit log
    Text,
    /// JSON report for scripting
    Json,
    /// CSV, one row per removal
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
