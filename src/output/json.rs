//! JSON output formatter for scan reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2024-05-01T12:00:00+00:00",
//!   "decisions": [
//!     {
//!       "canonical_name": "resident evil 2",
//!       "path": "/roms/Biohazard 2 (Japan).bin",
//!       "region": "japan",
//!       "version_info": "",
//!       "reason": "cross_regional",
//!       "kept_path": "/roms/Resident Evil 2 (USA).bin"
//!     }
//!   ],
//!   "buckets": [
//!     { "canonical_name": "resident evil 2", "files": 2, "verdict": { "kind": "cross_regional", ... } }
//!   ],
//!   "summary": { "files_scanned": 2, "games_found": 1, "files_to_remove": 1, ... }
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::duplicates::{BucketVerdict, DecisionReason, ScanReport, ScanSummary};
use crate::error::ExitCode;
use crate::parser::Region;
use crate::resolver::ResolverStats;

/// One removal in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDecision {
    /// Canonical name of the game
    pub canonical_name: String,
    /// Path to the removed file
    pub path: String,
    /// Region of the removed file
    pub region: Region,
    /// Revision/edition markers of the removed file
    pub version_info: String,
    /// `cross_regional` or `same_region`
    pub reason: &'static str,
    /// Path to the kept file
    pub kept_path: String,
}

/// One multi-member bucket in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonBucket {
    /// Canonical name of the game
    pub canonical_name: String,
    /// Number of members
    pub files: usize,
    /// Classification
    pub verdict: BucketVerdict,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// ROM files discovered
    pub files_scanned: usize,
    /// Distinct games
    pub games_found: usize,
    /// Files marked for removal
    pub files_to_remove: usize,
    /// Multi-disc games kept intact
    pub multi_disc_games: usize,
    /// Cross-regional removals
    pub cross_regional_duplicates: usize,
    /// Same-region removals
    pub same_region_duplicates: usize,
    /// Buckets left untouched for low confidence
    pub low_confidence_buckets: usize,
    /// Resolver counters
    pub resolver: ResolverStats,
    /// Number of non-fatal scan errors
    pub scan_errors: usize,
    /// Duration of the walking phase in milliseconds
    pub walk_duration_ms: u64,
    /// Duration of the resolving phase in milliseconds
    pub resolve_duration_ms: u64,
    /// Duration of the classifying phase in milliseconds
    pub classify_duration_ms: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "RC000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            files_scanned: summary.files_scanned,
            games_found: summary.games_found,
            files_to_remove: summary.files_to_remove,
            multi_disc_games: summary.multi_disc_games,
            cross_regional_duplicates: summary.cross_regional_duplicates,
            same_region_duplicates: summary.same_region_duplicates,
            low_confidence_buckets: summary.low_confidence_buckets,
            resolver: summary.resolver,
            scan_errors: summary.scan_errors.len(),
            walk_duration_ms: summary.walk_duration.as_millis() as u64,
            resolve_duration_ms: summary.resolve_duration.as_millis() as u64,
            classify_duration_ms: summary.classify_duration.as_millis() as u64,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Report creation time (RFC 3339)
    pub generated_at: String,
    /// Files to remove
    pub decisions: Vec<JsonDecision>,
    /// Buckets with two or more members
    pub buckets: Vec<JsonBucket>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a JSON output from a report and exit code.
    #[must_use]
    pub fn new(report: &ScanReport, exit_code: ExitCode) -> Self {
        Self::with_timestamp(report, exit_code, Utc::now())
    }

    /// Create a JSON output with a fixed creation time.
    #[must_use]
    pub fn with_timestamp(report: &ScanReport, exit_code: ExitCode, at: DateTime<Utc>) -> Self {
        let mut decisions = Vec::new();
        let mut buckets = Vec::new();
        for entry in &report.buckets {
            if !entry.bucket.has_duplicates() {
                continue;
            }
            buckets.push(JsonBucket {
                canonical_name: entry.bucket.canonical_name.clone(),
                files: entry.bucket.len(),
                verdict: entry.verdict,
            });
            decisions.extend(entry.decisions.iter().map(|d| JsonDecision {
                canonical_name: entry.bucket.canonical_name.clone(),
                path: d.file.path.to_string_lossy().into_owned(),
                region: d.file.region,
                version_info: d.file.version_info.clone(),
                reason: match d.reason {
                    DecisionReason::CrossRegionalDuplicate => "cross_regional",
                    DecisionReason::SameRegionInferior => "same_region",
                },
                kept_path: d.kept_counterpart.path.to_string_lossy().into_owned(),
            }));
        }

        Self {
            generated_at: at.to_rfc3339(),
            decisions,
            buckets,
            summary: JsonSummary::from_scan_summary(&report.summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
