//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Canonical-name grouping of ROM files
//! - Multi-disc release detection
//! - Cross-regional and same-region duplicate resolution
//! - The scan pipeline tying these together

pub mod decision;
pub mod finder;
pub mod groups;
pub mod multipart;

pub use decision::{
    analyze_bucket, resolve_bucket, usa_japan_rule, BucketAnalysis, BucketVerdict,
    CrossRegionalRule, Decision, DecisionReason, DuplicatePolicy, PriorityKey, UsaJapanOutcome,
};
pub use finder::{
    BucketReport, FinderConfig, FinderError, RomFinder, ScanReport, ScanSummary,
};
pub use groups::{group_files, group_resolved, BucketMap, CanonicalBucket, GroupingStats};
pub use multipart::is_multi_part;
