//! Grouping ROM files into canonical buckets.
//!
//! # Overview
//!
//! Every file's base name is resolved to a canonical name; files whose
//! canonical names are equal ignoring case share a [`CanonicalBucket`].
//! Members keep discovery order, and buckets are keyed by the normalized
//! canonical name in a `BTreeMap`, so grouping is deterministic given a
//! deterministic resolver.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use romdedupe::duplicates::group_files;
//! use romdedupe::resolver::{CanonicalResolver, ResolverCache};
//! use romdedupe::scanner::RomFile;
//!
//! let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()));
//! let files = vec![
//!     RomFile::from_filename("Game (USA).zip"),
//!     RomFile::from_filename("Game (Japan).zip"),
//!     RomFile::from_filename("Other (USA).zip"),
//! ];
//!
//! let (buckets, stats) = group_files(files, &resolver, |_| None);
//! assert_eq!(buckets.len(), 2);
//! assert_eq!(buckets["game"].len(), 2);
//! assert_eq!(stats.multi_member_buckets, 1);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::resolver::{normalize, CanonicalResolver, PlatformHint};
use crate::scanner::RomFile;

/// Files sharing one canonical identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalBucket {
    /// Canonical name as first resolved for this bucket
    pub canonical_name: String,
    /// Members in discovery order
    pub members: Vec<RomFile>,
}

impl CanonicalBucket {
    /// Create an empty bucket.
    #[must_use]
    pub fn new(canonical_name: impl Into<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            members: Vec::new(),
        }
    }

    /// Create a bucket with initial members.
    #[must_use]
    pub fn with_members(canonical_name: impl Into<String>, members: Vec<RomFile>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            members,
        }
    }

    /// Append a member.
    pub fn add(&mut self, file: RomFile) {
        self.members.push(file);
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if this bucket can hold duplicates (2+ members).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.members.len() > 1
    }

    /// Member filenames in discovery order.
    #[must_use]
    pub fn filenames(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.filename.as_str()).collect()
    }
}

/// Buckets keyed by normalized canonical name.
pub type BucketMap = BTreeMap<String, CanonicalBucket>;

/// Statistics from grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Total number of files grouped
    pub total_files: usize,
    /// Number of buckets
    pub buckets: usize,
    /// Buckets with a single member
    pub singleton_buckets: usize,
    /// Buckets with 2+ members
    pub multi_member_buckets: usize,
    /// Files in buckets with 2+ members
    pub potential_duplicates: usize,
}

/// Group files by resolving each base name.
///
/// `platform_of` supplies the platform hint passed to the resolver.
#[must_use]
pub fn group_files<F>(
    files: impl IntoIterator<Item = RomFile>,
    resolver: &CanonicalResolver,
    platform_of: F,
) -> (BucketMap, GroupingStats)
where
    F: Fn(&RomFile) -> Option<PlatformHint>,
{
    group_resolved(files.into_iter().map(|file| {
        let hint = platform_of(&file);
        let canonical = resolver.resolve(&file.base_name, hint.as_ref());
        (file, canonical)
    }))
}

/// Group files whose canonical names are already known.
///
/// Input order is taken as discovery order.
#[must_use]
pub fn group_resolved(
    resolved: impl IntoIterator<Item = (RomFile, String)>,
) -> (BucketMap, GroupingStats) {
    let mut buckets = BucketMap::new();
    let mut stats = GroupingStats::default();

    for (file, canonical) in resolved {
        stats.total_files += 1;
        log::trace!("{} -> {:?}", file.filename, canonical);
        buckets
            .entry(normalize(&canonical))
            .or_insert_with(|| CanonicalBucket::new(canonical.as_str()))
            .add(file);
    }

    stats.buckets = buckets.len();
    for bucket in buckets.values() {
        if bucket.has_duplicates() {
            stats.multi_member_buckets += 1;
            stats.potential_duplicates += bucket.len();
        } else {
            stats.singleton_buckets += 1;
        }
    }

    log::debug!(
        "Grouped {} files into {} buckets ({} with 2+ members)",
        stats.total_files,
        stats.buckets,
        stats.multi_member_buckets
    );

    (buckets, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{CachedResolution, ResolverCache};
    use std::sync::Arc;

    fn rom(name: &str) -> RomFile {
        RomFile::from_filename(name)
    }

    #[test]
    fn test_bucket_basics() {
        let mut bucket = CanonicalBucket::new("game");
        assert!(bucket.is_empty());
        assert!(!bucket.has_duplicates());

        bucket.add(rom("Game (USA).zip"));
        bucket.add(rom("Game (Japan).zip"));
        assert_eq!(bucket.len(), 2);
        assert!(bucket.has_duplicates());
        assert_eq!(bucket.filenames(), vec!["Game (USA).zip", "Game (Japan).zip"]);
    }

    #[test]
    fn test_group_resolved_is_case_insensitive() {
        let (buckets, stats) = group_resolved(vec![
            (rom("A (USA).zip"), "Mega Man".to_string()),
            (rom("B (Japan).zip"), "mega man ".to_string()),
            (rom("C (USA).zip"), "Contra".to_string()),
        ]);
        assert_eq!(buckets.len(), 2);
        let bucket = &buckets["mega man"];
        assert_eq!(bucket.canonical_name, "Mega Man");
        assert_eq!(bucket.filenames(), vec!["A (USA).zip", "B (Japan).zip"]);
        assert_eq!(stats.singleton_buckets, 1);
        assert_eq!(stats.potential_duplicates, 2);
    }

    #[test]
    fn test_group_files_uses_resolver_and_platform() {
        let cache = Arc::new(ResolverCache::new());
        cache.insert(
            "rockman_.nes".into(),
            CachedResolution::Resolved("mega man".into()),
        );
        cache.insert(
            "mega man_.nes".into(),
            CachedResolution::Resolved("mega man".into()),
        );
        let resolver = CanonicalResolver::new(cache);

        let files = vec![
            rom("Rockman (Japan).nes"),
            rom("Mega Man (USA).nes"),
            rom("Rockman (Japan).zip"),
        ];
        let (buckets, stats) = group_files(files, &resolver, RomFile::platform_hint);

        assert_eq!(stats.total_files, 3);
        assert_eq!(buckets["mega man"].len(), 2);
        // A different platform hint misses the cache entry.
        assert_eq!(buckets["rockman"].len(), 1);
    }

    #[test]
    fn test_group_empty_input() {
        let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()));
        let (buckets, stats) = group_files(Vec::new(), &resolver, |_| None);
        assert!(buckets.is_empty());
        assert_eq!(stats, GroupingStats::default());
    }
}
