use romdedupe::resolver::{
    CachedResolution, CanonicalLookup, CanonicalResolver, Candidate, LocalMappings, LookupError,
    PlatformHint, RateLimitedLookup, RateLimiter, ResolverCache, RetryPolicy,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// Lookup that counts calls and never finds anything.
#[derive(Default)]
struct EmptyCatalog {
    calls: AtomicUsize,
}

impl CanonicalLookup for EmptyCatalog {
    fn name(&self) -> &str {
        "empty"
    }

    fn lookup(
        &self,
        _title: &str,
        _platform: Option<&PlatformHint>,
    ) -> Result<Vec<Candidate>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

/// Lookup that is always unavailable.
#[derive(Default)]
struct Offline {
    calls: AtomicUsize,
}

impl CanonicalLookup for Offline {
    fn name(&self) -> &str {
        "offline"
    }

    fn lookup(
        &self,
        _title: &str,
        _platform: Option<&PlatformHint>,
    ) -> Result<Vec<Candidate>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LookupError::Transport("connection refused".into()))
    }
}

#[test]
fn test_negative_result_is_cached() {
    let catalog = Arc::new(EmptyCatalog::default());
    let resolver =
        CanonicalResolver::new(Arc::new(ResolverCache::new())).with_lookup(catalog.clone());
    let hint = PlatformHint::from_extension(".sfc");

    assert_eq!(resolver.resolve("Obscure Homebrew", hint.as_ref()), "Obscure Homebrew");
    assert_eq!(resolver.resolve("Obscure Homebrew", hint.as_ref()), "Obscure Homebrew");

    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    let stats = resolver.stats();
    assert_eq!(stats.unresolved, 1);
    assert_eq!(stats.cache_hits, 1);
}

#[test]
fn test_unavailable_lookup_degrades_to_identity() {
    let offline = Arc::new(Offline::default());
    let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()))
        .with_lookup(offline.clone())
        .with_lookup(Arc::new(LocalMappings::new()));

    // The next lookup in the chain still answers
    assert_eq!(resolver.resolve("Rockman X", None), "mega man x");
    // Nothing answers: identity
    assert_eq!(resolver.resolve("Zzyzx Quest", None), "Zzyzx Quest");
    assert_eq!(offline.calls.load(Ordering::SeqCst), 2);
    assert_eq!(resolver.stats().lookup_failures, 2);
}

#[test]
fn test_fuzzy_fallback_respects_sequel_numbers() {
    let cache = Arc::new(ResolverCache::new());
    cache.insert(
        ResolverCache::key("Final Fantasy II", None),
        CachedResolution::Resolved("final fantasy ii".into()),
    );
    let resolver = CanonicalResolver::new(cache);

    assert_eq!(resolver.resolve("Final Fantasy III", None), "Final Fantasy III");
    assert_eq!(resolver.resolve("Final Fantasy 2", None), "final fantasy ii");
}

#[test]
fn test_cache_survives_flush_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.json");

    let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()))
        .with_lookup(Arc::new(LocalMappings::new()));
    let hint = PlatformHint::from_extension(".bin");
    assert_eq!(resolver.resolve("Biohazard 2", hint.as_ref()), "resident evil 2");
    assert_eq!(resolver.resolve("Unknown Demo Disc", hint.as_ref()), "Unknown Demo Disc");
    resolver.cache().flush(&path).unwrap();

    let catalog = Arc::new(EmptyCatalog::default());
    let warm = CanonicalResolver::new(Arc::new(ResolverCache::load(&path).unwrap()))
        .with_lookup(catalog.clone());
    assert_eq!(warm.resolve("Biohazard 2", hint.as_ref()), "resident evil 2");
    assert_eq!(warm.resolve("Unknown Demo Disc", hint.as_ref()), "Unknown Demo Disc");
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_corrupt_cache_starts_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(ResolverCache::load(&path).is_err());
    assert!(ResolverCache::load_or_default(&path).is_empty());
}

#[test]
fn test_rate_limited_lookup_retries_transient_failures() {
    let limiter = Arc::new(RateLimiter::new(Duration::ZERO, 100));
    let retry = RetryPolicy {
        max_attempts: 3,
        backoff: Duration::ZERO,
    };
    let lookup = RateLimitedLookup::new(Offline::default(), Arc::clone(&limiter), retry);

    let result = lookup.lookup("Anything", None);
    assert!(matches!(result, Err(LookupError::Transport(_))));
    assert_eq!(lookup.inner().calls.load(Ordering::SeqCst), 3);
    assert_eq!(limiter.requests_in_window(), 3);
}

#[test]
fn test_concurrent_resolution_shares_cache() {
    let catalog = Arc::new(EmptyCatalog::default());
    let resolver = Arc::new(
        CanonicalResolver::new(Arc::new(ResolverCache::new())).with_lookup(catalog.clone()),
    );
    // Warm one title, then hammer it from many threads
    assert_eq!(resolver.resolve("Shared Title", None), "Shared Title");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            std::thread::spawn(move || resolver.resolve("Shared Title", None))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "Shared Title");
    }
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
}
