//! RomDedupe - Region-aware duplicate ROM finder
//!
//! Groups the regional releases, revisions and editions of each game under a
//! canonical name and decides which files are redundant, without ever
//! breaking up a multi-disc set. Files are never touched; the result is a
//! KEEP/REMOVE report in text, JSON or CSV.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod parser;
pub mod progress;
pub mod resolver;
pub mod scanner;
pub mod signal;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::cli::{Cli, Commands, OutputFormat, ParseArgs, ScanArgs};
use crate::config::Config;
use crate::duplicates::{FinderConfig, RomFinder, ScanReport};
use crate::error::ExitCode;
use crate::output::{CsvOutput, JsonOutput, TextOutput};
use crate::progress::{Progress, ProgressCallback, ThrottledReporter};
use crate::resolver::{CanonicalResolver, LocalMappings, ResolverCache};

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error if the scan cannot start, is interrupted, or the report
/// cannot be written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path, cli.profile.as_deref()),
        None => Config::load(cli.profile.as_deref()),
    };

    match &cli.command {
        Commands::Scan(args) => run_scan(&cli, args, config),
        Commands::Parse(args) => run_parse(args),
    }
}

/// Apply scan flags on top of the loaded configuration.
fn apply_overrides(mut config: Config, args: &ScanArgs) -> Config {
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    config.extensions.extend(args.extensions.iter().cloned());
    if !args.skip_dirs.is_empty() {
        config.skip_dirs.clone_from(&args.skip_dirs);
    }
    if args.follow_symlinks {
        config.follow_symlinks = true;
    }
    if args.include_hidden {
        config.skip_hidden = false;
    }
    if let Some(cache) = &args.cache {
        config.cache_path = Some(cache.clone());
    }
    if args.no_cache {
        config.use_cache = false;
    }
    if args.no_local_mappings {
        config.local_mappings = false;
    }
    if args.keep_japan_with_europe {
        config.europe_supersedes_japan = false;
    }
    config
}

fn open_cache(config: &Config, clear: bool) -> (Arc<ResolverCache>, Option<PathBuf>) {
    if !config.use_cache {
        log::debug!("Resolver cache disabled");
        return (Arc::new(ResolverCache::new()), None);
    }
    let Some(path) = config.resolved_cache_path() else {
        log::warn!("No cache directory available, resolver cache will not persist");
        return (Arc::new(ResolverCache::new()), None);
    };

    let cache = if clear {
        log::info!("Clearing resolver cache at {}", path.display());
        ResolverCache::new()
    } else {
        ResolverCache::load_or_default(&path)
    };
    (Arc::new(cache), Some(path))
}

fn flush_cache(cache: &ResolverCache, path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };
    match cache.flush(path) {
        Ok(()) => log::debug!("Saved {} cache entries to {}", cache.len(), path.display()),
        Err(e) => log::warn!("Failed to save resolver cache: {}", e),
    }
}

fn run_scan(cli: &Cli, args: &ScanArgs, config: Config) -> anyhow::Result<ExitCode> {
    let config = apply_overrides(config, args);
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler().context("Failed to install Ctrl+C handler")?;

    let (cache, cache_path) = open_cache(&config, args.clear_cache);
    let mut resolver = CanonicalResolver::new(Arc::clone(&cache));
    if config.local_mappings {
        resolver = resolver.with_lookup(Arc::new(LocalMappings::new()));
    }
    log::debug!("Resolver lookups: {:?}", resolver.lookup_names());

    let mut finder_config = FinderConfig::default()
        .with_threads(config.threads)
        .with_walker_config(config.walker_config())
        .with_policy(config.policy())
        .with_shutdown_flag(handler.get_flag());
    if !cli.quiet {
        let callback: Arc<dyn ProgressCallback> = if args.no_progress {
            Arc::new(ThrottledReporter::new(|percent, status| {
                log::debug!("{percent:>3.0}% {status}");
            }))
        } else {
            Arc::new(Progress::new())
        };
        finder_config = finder_config.with_progress_callback(callback);
    }

    let finder = RomFinder::new(finder_config, Arc::new(resolver));
    let result = finder
        .scan(&args.path)
        .with_context(|| format!("Failed to scan {}", args.path.display()));

    flush_cache(&cache, cache_path.as_deref());

    let report = result?;
    let exit_code = ExitCode::from_summary(&report.summary);
    log::info!(
        "{} games, {} files to remove",
        report.summary.games_found,
        report.summary.files_to_remove
    );

    match &args.output_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_report(&report, exit_code, args, false, &mut writer)?;
            writer.flush()?;
            log::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            write_report(&report, exit_code, args, !cli.no_color, &mut writer)?;
            writer.flush()?;
        }
    }

    Ok(exit_code)
}

fn write_report<W: Write>(
    report: &ScanReport,
    exit_code: ExitCode,
    args: &ScanArgs,
    color: bool,
    writer: &mut W,
) -> anyhow::Result<()> {
    match args.output {
        OutputFormat::Text => TextOutput::new(report)
            .with_color(color)
            .with_singletons(args.show_all)
            .write_to(writer)
            .context("Failed to write text report")?,
        OutputFormat::Json => JsonOutput::new(report, exit_code)
            .write_to(writer, true)
            .context("Failed to write JSON report")?,
        OutputFormat::Csv => CsvOutput::new(report)
            .write_to(writer)
            .context("Failed to write CSV report")?,
    }
    Ok(())
}

#[derive(Serialize)]
struct ParseRow<'a> {
    filename: &'a str,
    #[serde(flatten)]
    parsed: parser::ParsedName,
    has_disc_marker: bool,
}

fn run_parse(args: &ParseArgs) -> anyhow::Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_parsed(&args.filenames, args.json, &mut out)?;
    out.flush()?;
    Ok(ExitCode::Success)
}

fn write_parsed<W: Write>(filenames: &[String], json: bool, out: &mut W) -> anyhow::Result<()> {
    for filename in filenames {
        let normalized = scanner::normalize_filename(filename);
        let row = ParseRow {
            filename,
            parsed: parser::parse(&normalized),
            has_disc_marker: parser::has_disc_marker(&normalized),
        };
        if json {
            writeln!(out, "{}", serde_json::to_string(&row)?)?;
        } else {
            writeln!(out, "{}", row.filename)?;
            writeln!(out, "  region:       {}", row.parsed.region)?;
            writeln!(out, "  base name:    {}", row.parsed.base_name)?;
            writeln!(out, "  version info: {}", row.parsed.version_info)?;
            writeln!(out, "  disc marker:  {}", row.has_disc_marker)?;
        }
    }
    Ok(())
}
