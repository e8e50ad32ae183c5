use romdedupe::duplicates::{
    resolve_bucket, BucketVerdict, CanonicalBucket, DecisionReason, DuplicatePolicy, FinderConfig,
    RomFinder,
};
use romdedupe::resolver::{
    CanonicalLookup, CanonicalResolver, Candidate, LocalMappings, LookupError, PlatformHint,
    ResolverCache,
};
use romdedupe::scanner::{RomFile, WalkerConfig};
use std::fs::{self, File};
use std::sync::Arc;
use tempfile::tempdir;

fn bucket(names: &[&str]) -> CanonicalBucket {
    CanonicalBucket::with_members(
        "game",
        names.iter().map(|n| RomFile::from_filename(n)).collect(),
    )
}

fn finder() -> RomFinder {
    let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()))
        .with_lookup(Arc::new(LocalMappings::new()));
    RomFinder::new(FinderConfig::default(), Arc::new(resolver))
}

fn touch(dir: &std::path::Path, names: &[&str]) {
    for name in names {
        File::create(dir.join(name)).unwrap();
    }
}

/// Answers disc-numbered titles with the bare game name.
struct DiscCatalog;

impl CanonicalLookup for DiscCatalog {
    fn name(&self) -> &str {
        "disc-catalog"
    }

    fn lookup(
        &self,
        title: &str,
        _platform: Option<&PlatformHint>,
    ) -> Result<Vec<Candidate>, LookupError> {
        let base = title.split(" (Disc").next().unwrap_or(title);
        if base.eq_ignore_ascii_case("Final Fantasy VII") {
            Ok(vec![Candidate::new("Final Fantasy VII").with_alternate(title, "")])
        } else {
            Ok(Vec::new())
        }
    }
}

#[test]
fn test_usa_file_supersedes_japan_file() {
    let decisions = resolve_bucket(
        &bucket(&["Game (USA).zip", "Game (Japan).zip"]),
        &DuplicatePolicy::default(),
    );
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].file.filename, "Game (Japan).zip");
    assert_eq!(decisions[0].kept_counterpart.filename, "Game (USA).zip");
    assert_eq!(decisions[0].reason, DecisionReason::CrossRegionalDuplicate);
}

#[test]
fn test_japan_only_is_preserved() {
    let policy = DuplicatePolicy {
        europe_supersedes_japan: false,
    };
    assert!(resolve_bucket(&bucket(&["Game (Japan).zip"]), &policy).is_empty());
    assert!(resolve_bucket(&bucket(&["Game (Japan).zip", "Game (Europe).zip"]), &policy).is_empty());
    assert!(resolve_bucket(&bucket(&["Game (Japan).zip"]), &DuplicatePolicy::default()).is_empty());
}

#[test]
fn test_same_region_format_priority() {
    let decisions = resolve_bucket(
        &bucket(&["Game (USA).zip", "Game (USA).cue", "Game (USA) (Rev 1).bin"]),
        &DuplicatePolicy::default(),
    );
    let removed: Vec<&str> = decisions.iter().map(|d| d.file.filename.as_str()).collect();
    assert_eq!(removed, vec!["Game (USA).cue", "Game (USA) (Rev 1).bin"]);
    for decision in &decisions {
        assert_eq!(decision.reason, DecisionReason::SameRegionInferior);
        assert_eq!(decision.kept_counterpart.filename, "Game (USA).zip");
    }
}

#[test]
fn test_same_region_revision_tie_break() {
    let decisions = resolve_bucket(
        &bucket(&["Game (Europe) (Rev 1).zip", "Game (Europe) (Rev 2).zip"]),
        &DuplicatePolicy::default(),
    );
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].file.filename, "Game (Europe) (Rev 1).zip");
    assert_eq!(decisions[0].kept_counterpart.filename, "Game (Europe) (Rev 2).zip");
}

#[test]
fn test_scan_end_to_end() {
    let dir = tempdir().unwrap();
    touch(
        dir.path(),
        &[
            "Biohazard 2 (Japan).bin",
            "Resident Evil 2 (USA).bin",
            "Chrono Trigger (USA).sfc",
            "Chrono Trigger (USA) (Rev 1).sfc",
            "Earthbound (USA).zip",
            "readme.txt",
        ],
    );

    let report = finder().scan(dir.path()).unwrap();
    let mut removed: Vec<&str> = report
        .decisions
        .iter()
        .map(|d| d.file.filename.as_str())
        .collect();
    removed.sort_unstable();

    assert_eq!(removed, vec!["Biohazard 2 (Japan).bin", "Chrono Trigger (USA).sfc"]);
    assert_eq!(report.summary.files_scanned, 5);
    assert_eq!(report.summary.games_found, 3);
    assert_eq!(report.summary.cross_regional_duplicates, 1);
    assert_eq!(report.summary.same_region_duplicates, 1);
    assert!(report.summary.scan_errors.is_empty());
}

#[test]
fn test_scan_nested_and_skipped_directories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("snes").join("rpg");
    let quarantine = dir.path().join("to_delete");
    let hidden = dir.path().join(".trash");
    fs::create_dir_all(&nested).unwrap();
    fs::create_dir_all(&quarantine).unwrap();
    fs::create_dir_all(&hidden).unwrap();

    touch(&nested, &["Game (Japan).sfc"]);
    touch(dir.path(), &["Game (USA).sfc"]);
    touch(&quarantine, &["Game (Europe).sfc"]);
    touch(&hidden, &["Game (World).sfc"]);

    let report = finder().scan(dir.path()).unwrap();
    assert_eq!(report.summary.files_scanned, 2);
    assert_eq!(report.decisions.len(), 1);
    assert_eq!(report.decisions[0].file.path, nested.join("Game (Japan).sfc"));
}

#[test]
fn test_scan_extra_extensions() {
    let dir = tempdir().unwrap();
    touch(dir.path(), &["Game (USA).rom", "Game (Japan).rom"]);

    assert_eq!(finder().scan(dir.path()).unwrap().summary.files_scanned, 0);

    let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()));
    let finder = RomFinder::new(
        FinderConfig::default()
            .with_walker_config(WalkerConfig::default().with_extra_extensions(&["ROM"])),
        Arc::new(resolver),
    );
    let report = finder.scan(dir.path()).unwrap();
    assert_eq!(report.summary.files_scanned, 2);
    assert_eq!(report.decisions.len(), 1);
}

#[test]
fn test_scan_never_splits_multi_disc_release() {
    let dir = tempdir().unwrap();
    touch(
        dir.path(),
        &[
            "Final Fantasy VII (USA) (Disc 1).bin",
            "Final Fantasy VII (USA) (Disc 2).bin",
            "Final Fantasy VII (Japan) (Disc 1).bin",
            "Final Fantasy VII (Japan) (Disc 2).bin",
        ],
    );

    let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()))
        .with_lookup(Arc::new(DiscCatalog));
    let finder = RomFinder::new(FinderConfig::default(), Arc::new(resolver));
    let report = finder.scan(dir.path()).unwrap();

    assert_eq!(report.summary.games_found, 1);
    assert_eq!(report.buckets[0].verdict, BucketVerdict::MultiPart);
    assert!(report.decisions.is_empty());
    assert_eq!(report.summary.multi_disc_games, 1);
}

#[test]
fn test_result_independent_of_thread_count() {
    let dir = tempdir().unwrap();
    let mut names = Vec::new();
    for i in 0..20 {
        names.push(format!("Title {i} (USA).zip"));
        names.push(format!("Title {i} (Japan).zip"));
        names.push(format!("Title {i} (USA) (Rev 1).zip"));
    }
    for name in &names {
        File::create(dir.path().join(name)).unwrap();
    }

    let run = |threads: usize| {
        let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()))
            .with_lookup(Arc::new(LocalMappings::new()));
        let finder = RomFinder::new(
            FinderConfig::default().with_threads(threads),
            Arc::new(resolver),
        );
        finder.scan(dir.path()).unwrap().decisions
    };

    let single = run(1);
    assert_eq!(single, run(8));
    assert!(!single.is_empty());
}
