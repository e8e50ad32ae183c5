//! Canonical name resolution.
//!
//! # Overview
//!
//! [`CanonicalResolver`] maps a `(title, platform)` pair to the identity used
//! for grouping. It never fails:
//!
//! 1. **Cache** - a hit returns the cached answer, negative results included.
//! 2. **Lookups** - each configured [`CanonicalLookup`] is asked in order;
//!    candidates are scored with [`lookup::best_candidate`] and the first
//!    accepted match is normalized, cached and returned.
//! 3. **Fuzzy fallback** - the title is compared with every cached canonical
//!    name (see [`similarity::fuzzy_match`]).
//! 4. **Identity** - a negative result is cached and the title is returned
//!    unchanged.
//!
//! Lookup errors are logged and treated as "no candidates".
//!
//! Steps 1-2 and 3-4 are also exposed separately as
//! [`CanonicalResolver::try_resolve`] and [`CanonicalResolver::resolve_fallback`]
//! so a batch can run lookups in parallel and the order-sensitive fallback
//! sequentially.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use romdedupe::resolver::{CanonicalResolver, LocalMappings, ResolverCache};
//!
//! let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()))
//!     .with_lookup(Arc::new(LocalMappings::new()));
//!
//! assert_eq!(resolver.resolve("Biohazard 2", None), "resident evil 2");
//! assert_eq!(resolver.resolve("Resident Evil 2", None), "resident evil 2");
//! assert_eq!(resolver.resolve("Some Homebrew", None), "Some Homebrew");
//! ```

pub mod cache;
pub mod lookup;
pub mod mappings;
pub mod platform;
pub mod rate_limit;
pub mod similarity;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;

pub use cache::{normalize, CacheError, CacheResult, CachedResolution, ResolverCache};
pub use lookup::{
    best_candidate, AlternateName, Candidate, CanonicalLookup, LookupError, MatchType,
    ScoredMatch,
};
pub use mappings::LocalMappings;
pub use platform::PlatformHint;
pub use rate_limit::{RateLimitedLookup, RateLimiter, RetryPolicy};

/// Counters describing how titles were resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    /// Titles answered from the cache.
    pub cache_hits: usize,
    /// Calls made to lookups.
    pub lookups: usize,
    /// Lookup calls that returned an error.
    pub lookup_failures: usize,
    /// Titles resolved by a lookup.
    pub lookup_matches: usize,
    /// Titles resolved by the fuzzy fallback.
    pub fuzzy_matches: usize,
    /// Titles left as their own canonical name.
    pub unresolved: usize,
}

#[derive(Debug, Default)]
struct Counters {
    cache_hits: AtomicUsize,
    lookups: AtomicUsize,
    lookup_failures: AtomicUsize,
    lookup_matches: AtomicUsize,
    fuzzy_matches: AtomicUsize,
    unresolved: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Resolves titles to canonical names, sharing one cache across workers.
pub struct CanonicalResolver {
    cache: Arc<ResolverCache>,
    lookups: Vec<Arc<dyn CanonicalLookup>>,
    counters: Counters,
}

impl std::fmt::Debug for CanonicalResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanonicalResolver")
            .field("cache_entries", &self.cache.len())
            .field("lookups", &self.lookup_names())
            .field("stats", &self.stats())
            .finish()
    }
}

impl CanonicalResolver {
    /// Create a resolver with no lookups over the given cache.
    #[must_use]
    pub fn new(cache: Arc<ResolverCache>) -> Self {
        Self {
            cache,
            lookups: Vec::new(),
            counters: Counters::default(),
        }
    }

    /// Append a lookup; lookups are consulted in the order added.
    #[must_use]
    pub fn with_lookup(mut self, lookup: Arc<dyn CanonicalLookup>) -> Self {
        self.lookups.push(lookup);
        self
    }

    /// The shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<ResolverCache> {
        &self.cache
    }

    /// Names of the configured lookups, in consultation order.
    #[must_use]
    pub fn lookup_names(&self) -> Vec<&str> {
        self.lookups.iter().map(|l| l.name()).collect()
    }

    /// Snapshot of the resolution counters.
    #[must_use]
    pub fn stats(&self) -> ResolverStats {
        let c = &self.counters;
        ResolverStats {
            cache_hits: c.cache_hits.load(Ordering::Relaxed),
            lookups: c.lookups.load(Ordering::Relaxed),
            lookup_failures: c.lookup_failures.load(Ordering::Relaxed),
            lookup_matches: c.lookup_matches.load(Ordering::Relaxed),
            fuzzy_matches: c.fuzzy_matches.load(Ordering::Relaxed),
            unresolved: c.unresolved.load(Ordering::Relaxed),
        }
    }

    /// Resolve a title to its canonical name.
    #[must_use]
    pub fn resolve(&self, title: &str, platform: Option<&PlatformHint>) -> String {
        self.try_resolve(title, platform)
            .unwrap_or_else(|| self.resolve_fallback(title, platform))
    }

    /// Resolve from the cache or the lookups only.
    ///
    /// Returns `None` when neither produced an answer; nothing is cached in
    /// that case, so a later [`Self::resolve_fallback`] decides the outcome.
    #[must_use]
    pub fn try_resolve(&self, title: &str, platform: Option<&PlatformHint>) -> Option<String> {
        let key = ResolverCache::key(title, platform);

        if let Some(hit) = self.cache.get(&key) {
            bump(&self.counters.cache_hits);
            return Some(match hit {
                CachedResolution::Resolved(name) => name,
                CachedResolution::NoMatch => title.to_string(),
            });
        }

        for lookup in &self.lookups {
            bump(&self.counters.lookups);
            let candidates = match lookup.lookup(title, platform) {
                Ok(candidates) => candidates,
                Err(e) => {
                    bump(&self.counters.lookup_failures);
                    log::debug!("{} unavailable for {:?}: {}", lookup.name(), title, e);
                    continue;
                }
            };

            if let Some(m) = best_candidate(title, &candidates, platform) {
                let canonical = normalize(&m.canonical_name);
                log::debug!(
                    "{} resolved {:?} -> {:?} ({:?} match on {:?}, score {:.2})",
                    lookup.name(),
                    title,
                    canonical,
                    m.match_type,
                    m.matched_on,
                    m.score
                );
                self.cache
                    .insert(key, CachedResolution::Resolved(canonical.clone()));
                bump(&self.counters.lookup_matches);
                return Some(canonical);
            }
        }

        None
    }

    /// Resolve with the fuzzy fallback, then identity, caching the result.
    #[must_use]
    pub fn resolve_fallback(&self, title: &str, platform: Option<&PlatformHint>) -> String {
        let key = ResolverCache::key(title, platform);
        let names = self.cache.resolved_names();

        if let Some((name, ratio)) = similarity::fuzzy_match(title, names.iter().map(String::as_str)) {
            log::debug!("Fuzzy matched {:?} -> {:?} (ratio {:.2})", title, name, ratio);
            let name = name.to_string();
            self.cache
                .insert(key, CachedResolution::Resolved(name.clone()));
            bump(&self.counters.fuzzy_matches);
            return name;
        }

        log::trace!("No canonical name for {:?}", title);
        self.cache.insert(key, CachedResolution::NoMatch);
        bump(&self.counters.unresolved);
        title.to_string()
    }
}
