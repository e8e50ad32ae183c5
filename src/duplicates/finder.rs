//! ROM scan pipeline orchestration.
//!
//! # Overview
//!
//! [`RomFinder`] runs one decision pass over a directory:
//!
//! 1. **Walking** - discover ROM files in sorted order (see [`crate::scanner::Walker`])
//! 2. **Resolving** - resolve each distinct resolver cache key once.
//!    Cache and lookup resolution runs in parallel; the fuzzy fallback for
//!    the remaining titles runs sequentially in discovery order, so results
//!    do not depend on the thread count.
//! 3. **Grouping** - bucket files by canonical name (see [`super::groups`])
//! 4. **Classifying** - analyze buckets in parallel (see [`super::decision`])
//!
//! Cancellation is checked before each title and before each bucket. An
//! interrupted pass discards its decisions and returns
//! [`FinderError::Interrupted`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use romdedupe::duplicates::{FinderConfig, RomFinder};
//! use romdedupe::resolver::{CanonicalResolver, LocalMappings, ResolverCache};
//!
//! let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()))
//!     .with_lookup(Arc::new(LocalMappings::new()));
//! let finder = RomFinder::new(FinderConfig::default().with_threads(4), Arc::new(resolver));
//!
//! let report = finder.scan(Path::new("roms")).unwrap();
//! for decision in &report.decisions {
//!     println!("remove {} (kept {})", decision.file.filename, decision.kept_counterpart.filename);
//! }
//! println!("{}", report.summary);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::decision::{analyze_bucket, BucketVerdict, Decision, DecisionReason, DuplicatePolicy};
use super::groups::{group_resolved, CanonicalBucket};
use crate::progress::ProgressCallback;
use crate::resolver::{CanonicalResolver, PlatformHint, ResolverCache, ResolverStats};
use crate::scanner::{RomFile, ScanError, Walker, WalkerConfig};

/// Configuration for a scan pass.
#[derive(Clone)]
pub struct FinderConfig {
    /// Worker threads for resolution and bucket analysis.
    pub threads: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Duplicate resolution policy.
    pub policy: DuplicatePolicy,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("threads", &self.threads)
            .field("walker_config", &self.walker_config)
            .field("policy", &self.policy)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            walker_config: WalkerConfig::default(),
            policy: DuplicatePolicy::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the worker thread count (at least 1).
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the duplicate resolution policy.
    #[must_use]
    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a scan pass.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// ROM files discovered
    pub files_scanned: usize,
    /// Canonical buckets (distinct games)
    pub games_found: usize,
    /// Files marked for removal
    pub files_to_remove: usize,
    /// Buckets kept intact as multi-part releases
    pub multi_disc_games: usize,
    /// Removals for cross-regional duplicates
    pub cross_regional_duplicates: usize,
    /// Removals for same-region inferior variants
    pub same_region_duplicates: usize,
    /// Buckets left untouched because the regional match was uncertain
    pub low_confidence_buckets: usize,
    /// Resolution counters for this pass
    pub resolver: ResolverStats,
    /// Non-fatal walk errors
    pub scan_errors: Vec<ScanError>,
    /// Time spent walking
    pub walk_duration: Duration,
    /// Time spent resolving titles
    pub resolve_duration: Duration,
    /// Time spent classifying buckets
    pub classify_duration: Duration,
    /// Duration of the entire pass
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Whether any file was marked for removal.
    #[must_use]
    pub fn has_decisions(&self) -> bool {
        self.files_to_remove > 0
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files scanned:             {}", self.files_scanned)?;
        writeln!(f, "Games found:               {}", self.games_found)?;
        writeln!(f, "Files to remove:           {}", self.files_to_remove)?;
        writeln!(f, "  cross-regional:          {}", self.cross_regional_duplicates)?;
        writeln!(f, "  same-region:             {}", self.same_region_duplicates)?;
        writeln!(f, "Multi-disc games kept:     {}", self.multi_disc_games)?;
        writeln!(f, "Low-confidence buckets:    {}", self.low_confidence_buckets)?;
        writeln!(
            f,
            "Resolver:                  {} cache hits, {} lookups, {} fuzzy, {} unresolved",
            self.resolver.cache_hits,
            self.resolver.lookups,
            self.resolver.fuzzy_matches,
            self.resolver.unresolved
        )?;
        if !self.scan_errors.is_empty() {
            writeln!(f, "Scan errors:               {}", self.scan_errors.len())?;
        }
        write!(
            f,
            "Completed in {:.2}s",
            self.scan_duration.as_secs_f64()
        )
    }
}

/// One bucket with its classification.
#[derive(Debug, Clone)]
pub struct BucketReport {
    /// The bucket
    pub bucket: CanonicalBucket,
    /// How it was classified
    pub verdict: BucketVerdict,
    /// Removals within this bucket
    pub decisions: Vec<Decision>,
}

/// Result of a scan pass.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Every bucket, ordered by normalized canonical name
    pub buckets: Vec<BucketReport>,
    /// All decisions, in bucket order
    pub decisions: Vec<Decision>,
    /// Statistics
    pub summary: ScanSummary,
}

/// Errors that can occur during a scan pass.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The worker pool could not be created.
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(String),

    /// A scan error occurred.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// First file seen for a resolver cache key.
#[derive(Debug)]
struct TitleQuery {
    key: String,
    title: String,
    platform: Option<PlatformHint>,
}

/// Runs scan passes against a shared resolver.
pub struct RomFinder {
    config: FinderConfig,
    resolver: Arc<CanonicalResolver>,
}

impl std::fmt::Debug for RomFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RomFinder")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .finish()
    }
}

impl RomFinder {
    /// Create a finder.
    #[must_use]
    pub fn new(config: FinderConfig, resolver: Arc<CanonicalResolver>) -> Self {
        Self { config, resolver }
    }

    /// The shared resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<CanonicalResolver> {
        &self.resolver
    }

    /// Scan a directory and decide which files to remove.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist
    /// - The path is not a directory
    /// - The worker pool cannot be built
    /// - The scan is interrupted by shutdown signal
    pub fn scan(&self, path: &Path) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();

        if !path.exists() {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Scanning {}", path.display());

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
            callback.on_message(&format!("Walking {}", path.display()));
        }

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
        }

        let mut files = Vec::new();
        let mut scan_errors = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => files.push(file),
                Err(e) => scan_errors.push(e),
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let walk_duration = start_time.elapsed();
        log::info!(
            "Found {} ROM files ({} errors) in {:.2}s",
            files.len(),
            scan_errors.len(),
            walk_duration.as_secs_f64()
        );

        let mut report = self.analyze_files(files)?;
        report.summary.scan_errors = scan_errors;
        report.summary.walk_duration = walk_duration;
        report.summary.scan_duration = start_time.elapsed();
        Ok(report)
    }

    /// Decide which of an already-discovered file list to remove.
    ///
    /// Input order is taken as discovery order.
    ///
    /// # Errors
    ///
    /// Returns `FinderError::Interrupted` on cancellation and
    /// `FinderError::ThreadPool` if the worker pool cannot be built.
    pub fn analyze_files(&self, files: Vec<RomFile>) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();
        let stats_before = self.resolver.stats();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| FinderError::ThreadPool(e.to_string()))?;

        // Distinct cache keys in discovery order; titles differing only in
        // case or punctuation share one resolution
        let keys: Vec<String> = files
            .iter()
            .map(|f| ResolverCache::key(&f.base_name, f.platform_hint().as_ref()))
            .collect();
        let mut unique: Vec<TitleQuery> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for (file, key) in files.iter().zip(&keys) {
            if seen.insert(key.as_str()) {
                unique.push(TitleQuery {
                    key: key.clone(),
                    title: file.base_name.clone(),
                    platform: file.platform_hint(),
                });
            }
        }

        let canonical = self.resolve_titles(&pool, &unique)?;
        let resolve_duration = start_time.elapsed();

        let (buckets, grouping) = group_resolved(
            files
                .into_iter()
                .zip(keys.iter())
                .map(|(file, key)| {
                    let name = canonical
                        .get(key)
                        .cloned()
                        .unwrap_or_else(|| file.base_name.clone());
                    (file, name)
                }),
        );

        let classify_start = Instant::now();
        let buckets = self.classify_buckets(&pool, buckets.into_values().collect())?;

        let mut summary = ScanSummary {
            files_scanned: grouping.total_files,
            games_found: grouping.buckets,
            resolver: stats_delta(stats_before, self.resolver.stats()),
            resolve_duration,
            classify_duration: classify_start.elapsed(),
            ..Default::default()
        };

        let mut decisions = Vec::new();
        for report in &buckets {
            match report.verdict {
                BucketVerdict::MultiPart => summary.multi_disc_games += 1,
                BucketVerdict::LowConfidence { .. } => summary.low_confidence_buckets += 1,
                _ => {}
            }
            for decision in &report.decisions {
                match decision.reason {
                    DecisionReason::CrossRegionalDuplicate => summary.cross_regional_duplicates += 1,
                    DecisionReason::SameRegionInferior => summary.same_region_duplicates += 1,
                }
            }
            decisions.extend(report.decisions.iter().cloned());
        }
        summary.files_to_remove = decisions.len();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "{} games, {} files to remove ({} cross-regional, {} same-region)",
            summary.games_found,
            summary.files_to_remove,
            summary.cross_regional_duplicates,
            summary.same_region_duplicates
        );

        Ok(ScanReport {
            buckets,
            decisions,
            summary,
        })
    }

    fn resolve_titles(
        &self,
        pool: &rayon::ThreadPool,
        unique: &[TitleQuery],
    ) -> Result<HashMap<String, String>, FinderError> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("resolving", unique.len());
        }

        // Order-preserving parallel map over cache and lookups
        let attempts: Vec<Option<Option<String>>> = pool.install(|| {
            unique
                .par_iter()
                .enumerate()
                .map(|(idx, query)| {
                    if self.config.is_shutdown_requested() {
                        return None;
                    }
                    let resolved = self
                        .resolver
                        .try_resolve(&query.title, query.platform.as_ref());
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(idx + 1, &query.title);
                    }
                    Some(resolved)
                })
                .collect()
        });

        let mut canonical = HashMap::with_capacity(unique.len());
        for (query, attempt) in unique.iter().zip(attempts) {
            let Some(resolved) = attempt else {
                log::debug!("Resolving: shutdown requested, discarding pass");
                return Err(FinderError::Interrupted);
            };
            let name = match resolved {
                Some(name) => name,
                None => {
                    if self.config.is_shutdown_requested() {
                        return Err(FinderError::Interrupted);
                    }
                    self.resolver
                        .resolve_fallback(&query.title, query.platform.as_ref())
                }
            };
            canonical.insert(query.key.clone(), name);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("resolving");
        }
        Ok(canonical)
    }

    fn classify_buckets(
        &self,
        pool: &rayon::ThreadPool,
        buckets: Vec<CanonicalBucket>,
    ) -> Result<Vec<BucketReport>, FinderError> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("classifying", buckets.len());
        }

        let policy = self.config.policy;
        let reports: Vec<Option<BucketReport>> = pool.install(|| {
            buckets
                .into_par_iter()
                .enumerate()
                .map(|(idx, bucket)| {
                    if self.config.is_shutdown_requested() {
                        return None;
                    }
                    let analysis = analyze_bucket(&bucket, &policy);
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(idx + 1, &bucket.canonical_name);
                    }
                    Some(BucketReport {
                        bucket,
                        verdict: analysis.verdict,
                        decisions: analysis.decisions,
                    })
                })
                .collect()
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("classifying");
        }

        reports
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(FinderError::Interrupted)
    }
}

fn stats_delta(before: ResolverStats, after: ResolverStats) -> ResolverStats {
    ResolverStats {
        cache_hits: after.cache_hits - before.cache_hits,
        lookups: after.lookups - before.lookups,
        lookup_failures: after.lookup_failures - before.lookup_failures,
        lookup_matches: after.lookup_matches - before.lookup_matches,
        fuzzy_matches: after.fuzzy_matches - before.fuzzy_matches,
        unresolved: after.unresolved - before.unresolved,
    }
}
