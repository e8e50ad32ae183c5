//! Resolver cache with optional JSON persistence.
//!
//! The cache memoizes every resolution keyed by normalized title and
//! platform hint. Negative results are stored as [`CachedResolution::NoMatch`]
//! so an unresolvable title is never looked up twice.
//!
//! # File format
//!
//! ```json
//! {
//!   "version": 1,
//!   "checksum": "<sha256 of the compact entries object>",
//!   "entries": { "biohazard_.psx": "resident evil", "obscure game_.nes": null }
//! }
//! ```
//!
//! `null` marks a cached negative result. Files are written to a temporary
//! sibling first and renamed into place.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::platform::PlatformHint;

/// Current cache file format version.
pub const CACHE_VERSION: u32 = 1;

/// Errors from cache persistence.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("Cache I/O error for {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid cache document.
    #[error("Failed to parse cache file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The stored checksum does not match the entries.
    #[error("Cache integrity check failed for {0}")]
    ChecksumMismatch(PathBuf),

    /// The file was written by an incompatible version.
    #[error("Unsupported cache version {0}")]
    UnsupportedVersion(u32),
}

/// Result type for cache persistence.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cached outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedResolution {
    /// The title resolved to this canonical name.
    Resolved(String),
    /// Resolution failed; the title stands for itself.
    NoMatch,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    checksum: String,
    entries: BTreeMap<String, Option<String>>,
}

/// Normalize a title for cache keys and canonical names: lowercase + trim.
#[must_use]
pub fn normalize(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Concurrent memo of canonical-name resolutions.
///
/// Safe to share across worker threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct ResolverCache {
    entries: DashMap<String, CachedResolution>,
}

impl ResolverCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a title and optional platform hint.
    #[must_use]
    pub fn key(title: &str, platform: Option<&PlatformHint>) -> String {
        format!(
            "{}_{}",
            normalize(title),
            platform.map_or("unknown", PlatformHint::as_str)
        )
    }

    /// Look up a cached resolution.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CachedResolution> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store a resolution, replacing any previous one.
    pub fn insert(&self, key: String, value: CachedResolution) {
        self.entries.insert(key, value);
    }

    /// Number of cached entries, negative ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Distinct successful canonical names, sorted.
    #[must_use]
    pub fn resolved_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| match entry.value() {
                CachedResolution::Resolved(name) => Some(name.clone()),
                CachedResolution::NoMatch => None,
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Copy of all entries as a key → name map (`None` = no match).
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Option<String>> {
        self.entries
            .iter()
            .map(|entry| {
                let value = match entry.value() {
                    CachedResolution::Resolved(name) => Some(name.clone()),
                    CachedResolution::NoMatch => None,
                };
                (entry.key().clone(), value)
            })
            .collect()
    }

    /// Build a cache from a key → name map (`None` = no match).
    pub fn from_snapshot(snapshot: impl IntoIterator<Item = (String, Option<String>)>) -> Self {
        let entries = snapshot
            .into_iter()
            .map(|(key, value)| {
                let value = value.map_or(CachedResolution::NoMatch, CachedResolution::Resolved);
                (key, value)
            })
            .collect();
        Self { entries }
    }

    /// Load a persisted cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a cache document,
    /// fails its checksum, or has an unsupported version.
    pub fn load(path: &Path) -> CacheResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CacheFile = serde_json::from_str(&content)?;

        if file.version != CACHE_VERSION {
            return Err(CacheError::UnsupportedVersion(file.version));
        }
        if checksum(&file.entries)? != file.checksum {
            return Err(CacheError::ChecksumMismatch(path.to_path_buf()));
        }

        log::debug!("Loaded {} cache entries from {}", file.entries.len(), path.display());
        Ok(Self::from_snapshot(file.entries))
    }

    /// Load a persisted cache, falling back to an empty one.
    ///
    /// A missing file is expected on first run. Any other failure is logged
    /// and the bad file will be overwritten on the next flush.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No resolver cache at {}, starting empty", path.display());
            return Self::new();
        }
        match Self::load(path) {
            Ok(cache) => cache,
            Err(e) => {
                log::warn!("Ignoring unreadable resolver cache: {}", e);
                Self::new()
            }
        }
    }

    /// Persist the cache atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory or the file cannot be
    /// written.
    pub fn flush(&self, path: &Path) -> CacheResult<()> {
        let entries = self.snapshot();
        let file = CacheFile {
            version: CACHE_VERSION,
            checksum: checksum(&entries)?,
            entries,
        };
        let json = serde_json::to_string_pretty(&file)?;

        let io_err = |source: std::io::Error| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = path.with_extension("json.tmp");
        let mut out = fs::File::create(&tmp).map_err(io_err)?;
        out.write_all(json.as_bytes()).map_err(io_err)?;
        out.sync_all().map_err(io_err)?;
        drop(out);
        fs::rename(&tmp, path).map_err(io_err)?;

        log::debug!("Flushed {} cache entries to {}", file.entries.len(), path.display());
        Ok(())
    }
}

fn checksum(entries: &BTreeMap<String, Option<String>>) -> CacheResult<String> {
    let compact = serde_json::to_string(entries)?;
    let mut hasher = Sha256::new();
    hasher.update(compact.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
