//! Application configuration management.
//!
//! Configuration is layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. The TOML config file
//! 3. A `[profile.<name>]` table from the same file, when selected
//! 4. `ROMDEDUPE_*` environment variables (`__` separates nested keys,
//!    e.g. `ROMDEDUPE_RATE_LIMIT__HOURLY_CAP=100`)
//!
//! CLI flags are applied on top by the driver.
//!
//! ```toml
//! threads = 8
//! extensions = ["rom"]
//! europe_supersedes_japan = false
//!
//! [rate_limit]
//! min_interval_ms = 2000
//!
//! [profile.fast]
//! use_cache = false
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::DuplicatePolicy;
use crate::resolver::rate_limit::{DEFAULT_HOURLY_CAP, DEFAULT_MIN_INTERVAL};
use crate::resolver::{RateLimiter, RetryPolicy};
use crate::scanner::WalkerConfig;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "ROMDEDUPE_";

/// Top-level keys accepted in the config file.
const KNOWN_KEYS: &[&str] = &[
    "threads",
    "extensions",
    "skip_dirs",
    "follow_symlinks",
    "skip_hidden",
    "cache_path",
    "use_cache",
    "local_mappings",
    "europe_supersedes_japan",
    "rate_limit",
    "retry",
    "profile",
];

/// Rate limiter settings for external lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum time between requests, in milliseconds.
    pub min_interval_ms: u64,
    /// Maximum requests per hour.
    pub hourly_cap: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_INTERVAL.as_millis() as u64,
            hourly_cap: DEFAULT_HOURLY_CAP,
        }
    }
}

/// Bounded retry settings for external lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per lookup, including the first.
    pub max_attempts: u32,
    /// Linear backoff step, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            backoff_ms: policy.backoff.as_millis() as u64,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads for resolution and bucket analysis.
    pub threads: usize,
    /// Extensions accepted in addition to the built-in ROM table.
    pub extensions: Vec<String>,
    /// Directory names never scanned.
    pub skip_dirs: Vec<String>,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Resolver cache file; the platform cache directory when unset.
    pub cache_path: Option<PathBuf>,
    /// Load and flush the resolver cache.
    pub use_cache: bool,
    /// Consult the built-in regional title table.
    pub local_mappings: bool,
    /// Remove Japan releases when Europe (but not USA) is present.
    pub europe_supersedes_japan: bool,
    /// Rate limiter settings for a `CanonicalLookup` wrapped in
    /// `RateLimitedLookup`. The built-in regional table is local and never
    /// rate limited, so these only take effect for an externally supplied
    /// lookup.
    pub rate_limit: RateLimitConfig,
    /// Retry settings for an externally supplied lookup, as for `rate_limit`.
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        let walker = WalkerConfig::default();
        Self {
            threads: 4,
            extensions: Vec::new(),
            skip_dirs: walker.skip_dirs,
            follow_symlinks: walker.follow_symlinks,
            skip_hidden: walker.skip_hidden,
            cache_path: None,
            use_cache: true,
            local_mappings: true,
            europe_supersedes_japan: DuplicatePolicy::default().europe_supersedes_japan,
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default config path.
    #[must_use]
    pub fn load(profile: Option<&str>) -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from_path(&path, profile),
            None => Self::load_from_figment(Self::base_figment(None), profile),
        }
    }

    /// Load from a specific file. Never fails.
    ///
    /// A missing file yields the defaults; an unreadable or invalid file
    /// logs a warning and yields the defaults.
    #[must_use]
    pub fn load_from_path(path: &Path, profile: Option<&str>) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match content.parse::<toml::Table>() {
                    Ok(table) => warn_unknown_keys(path, &table),
                    Err(e) => {
                        log::warn!("Invalid config file {}: {}", path.display(), e);
                        return Self::default();
                    }
                },
                Err(e) => {
                    log::warn!("Cannot read config file {}: {}", path.display(), e);
                    return Self::default();
                }
            }
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
        }

        Self::load_from_figment(Self::base_figment(Some(path)), profile)
    }

    fn base_figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        }
    }

    fn load_from_figment(base: Figment, profile: Option<&str>) -> Self {
        let mut figment = base.clone();
        if let Some(name) = profile {
            let key = format!("profile.{name}");
            if base.contains(&key) {
                log::debug!("Using config profile {name:?}");
                figment = figment.merge(base.focus(&key));
            } else {
                log::warn!("Unknown config profile {name:?}, using base settings");
            }
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment.extract().unwrap_or_else(|e| {
            log::warn!("Invalid configuration, using defaults: {e}");
            Self::default()
        })
    }

    /// Profile names defined in a config file, sorted.
    #[must_use]
    pub fn list_profiles(path: &Path) -> Vec<String> {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Vec::new();
        };
        let Ok(table) = content.parse::<toml::Table>() else {
            return Vec::new();
        };
        let mut names: Vec<String> = table
            .get("profile")
            .and_then(toml::Value::as_table)
            .map(|profiles| profiles.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Default config file path for this platform.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolver cache path: `cache_path` or the platform cache directory.
    #[must_use]
    pub fn resolved_cache_path(&self) -> Option<PathBuf> {
        self.cache_path
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.cache_dir().join("resolver_cache.json")))
    }

    /// Walker settings.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_extra_extensions(&self.extensions)
            .with_skip_dirs(self.skip_dirs.clone())
            .with_follow_symlinks(self.follow_symlinks)
            .with_skip_hidden(self.skip_hidden)
    }

    /// Duplicate resolution policy.
    #[must_use]
    pub fn policy(&self) -> DuplicatePolicy {
        DuplicatePolicy {
            europe_supersedes_japan: self.europe_supersedes_japan,
        }
    }

    /// Process-wide rate limiter for external lookups.
    #[must_use]
    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(
            Duration::from_millis(self.rate_limit.min_interval_ms),
            self.rate_limit.hourly_cap,
        ))
    }

    /// Retry policy for external lookups.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            backoff: Duration::from_millis(self.retry.backoff_ms),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "romdedupe", "romdedupe")
}

/// Unknown top-level keys, each with the closest known key if one is close.
#[must_use]
pub fn unknown_keys(table: &toml::Table) -> BTreeMap<String, Option<&'static str>> {
    table
        .keys()
        .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
        .map(|key| (key.clone(), suggest_key(key)))
        .collect()
}

fn suggest_key(key: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|known| (*known, strsim::jaro_winkler(key, known)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| known)
}

fn warn_unknown_keys(path: &Path, table: &toml::Table) {
    for (key, suggestion) in unknown_keys(table) {
        match suggestion {
            Some(known) => log::warn!(
                "Unknown key {key:?} in {}, did you mean {known:?}?",
                path.display()
            ),
            None => log::warn!("Unknown key {key:?} in {}", path.display()),
        }
    }
}
