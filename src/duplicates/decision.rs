//! Per-bucket duplicate resolution.
//!
//! # Overview
//!
//! [`analyze_bucket`] decides which members of one [`CanonicalBucket`] are
//! redundant. Buckets with fewer than two members, and multi-part releases,
//! produce no decisions. Otherwise:
//!
//! 1. Members are partitioned by region, in order of first appearance.
//! 2. Cross-regional rules apply in fixed order:
//!    - **USA + Japan**: Japan files are removed unless the match looks too
//!      uncertain (see [`usa_japan_rule`]).
//!    - **Europe + Japan, no USA**: Japan files are removed, subject to
//!      [`DuplicatePolicy::europe_supersedes_japan`].
//! 3. Only if no cross-regional rule applied, each region with two or more
//!    members keeps its single best file by [`PriorityKey`]; ties go to the
//!    first discovered file.
//!
//! No I/O is performed; decisions carry the kept counterpart for audit logs.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use super::groups::CanonicalBucket;
use super::multipart::is_multi_part;
use crate::parser::patterns::REVISION_NUMBER;
use crate::parser::{Region, DEV_BUILD_KEYWORDS, SPECIAL_EDITION_KEYWORDS};
use crate::resolver::similarity::similarity_ratio;
use crate::scanner::RomFile;

/// Name similarity below which a USA/Japan pairing is doubted.
pub const CROSS_REGION_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Why a file was marked for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DecisionReason {
    /// A regional release superseded by a higher-priority region.
    CrossRegionalDuplicate,
    /// A same-region variant with a worse format, edition or revision.
    SameRegionInferior,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CrossRegionalDuplicate => "cross-regional duplicate",
            Self::SameRegionInferior => "same-region inferior",
        })
    }
}

/// One file marked for removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// The file to remove
    pub file: RomFile,
    /// Why it is removed
    pub reason: DecisionReason,
    /// The file kept in its place
    pub kept_counterpart: RomFile,
}

/// Tunable resolution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicatePolicy {
    /// Remove Japan files when Europe (but not USA) is present.
    ///
    /// When false, Japan files survive whenever no USA release exists.
    pub europe_supersedes_japan: bool,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            europe_supersedes_japan: true,
        }
    }
}

/// Which cross-regional rule removed the Japan files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum CrossRegionalRule {
    /// USA and Japan names are similar enough.
    UsaOverJapan {
        /// Best USA/Japan base-name similarity
        max_ratio: f64,
    },
    /// Names differ, but several distinct titles were grouped together, so
    /// the grouping itself is taken as proof.
    UsaOverJapanByGrouping {
        /// Best USA/Japan base-name similarity
        max_ratio: f64,
    },
    /// Europe present, USA absent.
    EuropeOverJapan,
}

/// Outcome class of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BucketVerdict {
    /// Fewer than two members.
    Singleton,
    /// Multi-part release, kept intact.
    MultiPart,
    /// USA/Japan match too uncertain, everything kept.
    LowConfidence {
        /// Best USA/Japan base-name similarity
        max_ratio: f64,
    },
    /// Japan files removed in favor of another region.
    CrossRegional {
        /// The rule that applied
        rule: CrossRegionalRule,
    },
    /// Same-region resolution ran (possibly removing nothing).
    SameRegion,
}

/// Decisions for one bucket together with the verdict that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketAnalysis {
    /// How the bucket was classified
    pub verdict: BucketVerdict,
    /// Files to remove, each with its kept counterpart
    pub decisions: Vec<Decision>,
}

impl BucketAnalysis {
    fn keep_all(verdict: BucketVerdict) -> Self {
        Self {
            verdict,
            decisions: Vec::new(),
        }
    }

    /// Whether a member is kept.
    #[must_use]
    pub fn is_kept(&self, file: &RomFile) -> bool {
        !self.decisions.iter().any(|d| d.file.path == file.path)
    }
}

/// Same-region preference: format, then edition, then revision.
///
/// Compared lexicographically, higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PriorityKey {
    /// 3 for `.zip`, 2 for `.cue`, 1 for `.bin`, 0 otherwise
    pub format: u8,
    /// 3 standard, 2 special/limited/premium, 1 beta/proto/demo
    pub edition: u8,
    /// Number after a "rev" marker, 0 when absent
    pub revision: u64,
}

impl PriorityKey {
    /// Compute the key from a filename.
    #[must_use]
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();

        let format = if lower.ends_with(".zip") {
            3
        } else if lower.ends_with(".cue") {
            2
        } else if lower.ends_with(".bin") {
            1
        } else {
            0
        };

        // A development build outranks the special-edition check.
        let mut edition = 3;
        if SPECIAL_EDITION_KEYWORDS.iter().any(|k| lower.contains(k)) {
            edition = 2;
        }
        if DEV_BUILD_KEYWORDS.iter().any(|k| lower.contains(k)) {
            edition = 1;
        }

        let revision = REVISION_NUMBER
            .captures(&lower)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);

        Self {
            format,
            edition,
            revision,
        }
    }
}

/// Outcome of the USA + Japan rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsaJapanOutcome {
    /// Remove Japan files; names are similar.
    RemoveJapan,
    /// Remove Japan files; the grouping is trusted despite dissimilar names.
    RemoveJapanByGrouping,
    /// Keep everything.
    KeepAll,
}

/// Apply the USA + Japan rule.
///
/// `distinct_stems` counts distinct case-normalized base names in the
/// bucket; `max_ratio` is the best USA/Japan base-name similarity.
#[must_use]
pub fn usa_japan_rule(distinct_stems: usize, max_ratio: f64) -> UsaJapanOutcome {
    if max_ratio >= CROSS_REGION_SIMILARITY_THRESHOLD {
        UsaJapanOutcome::RemoveJapan
    } else if distinct_stems > 1 {
        UsaJapanOutcome::RemoveJapanByGrouping
    } else {
        UsaJapanOutcome::KeepAll
    }
}

/// Decide which files of a bucket to remove.
#[must_use]
pub fn resolve_bucket(bucket: &CanonicalBucket, policy: &DuplicatePolicy) -> Vec<Decision> {
    analyze_bucket(bucket, policy).decisions
}

/// Decide which files of a bucket to remove, reporting the verdict.
///
/// The KEEP/REMOVE trail of every multi-member bucket is logged at debug level.
#[must_use]
pub fn analyze_bucket(bucket: &CanonicalBucket, policy: &DuplicatePolicy) -> BucketAnalysis {
    let analysis = classify_bucket(bucket, policy);
    if bucket.has_duplicates() && log::log_enabled!(log::Level::Debug) {
        log::debug!("{}:", bucket.canonical_name);
        for (action, filename) in audit_trail(bucket, &analysis) {
            log::debug!("  {action}: {filename}");
        }
    }
    analysis
}

/// `KEEP`/`REMOVE` per bucket member, in member order.
fn audit_trail<'a>(
    bucket: &'a CanonicalBucket,
    analysis: &BucketAnalysis,
) -> Vec<(&'static str, &'a str)> {
    bucket
        .members
        .iter()
        .map(|member| {
            let action = if analysis.decisions.iter().any(|d| d.file == *member) {
                "REMOVE"
            } else {
                "KEEP"
            };
            (action, member.filename.as_str())
        })
        .collect()
}

fn classify_bucket(bucket: &CanonicalBucket, policy: &DuplicatePolicy) -> BucketAnalysis {
    if !bucket.has_duplicates() {
        return BucketAnalysis::keep_all(BucketVerdict::Singleton);
    }
    if is_multi_part(&bucket.filenames()) {
        log::debug!("{}: multi-part release, keeping all files", bucket.canonical_name);
        return BucketAnalysis::keep_all(BucketVerdict::MultiPart);
    }

    let regions = partition_by_region(&bucket.members);
    let usa = members_of(&regions, Region::Usa);
    let japan = members_of(&regions, Region::Japan);
    let europe = members_of(&regions, Region::Europe);

    if let (Some(&kept), false) = (usa.first(), japan.is_empty()) {
        let max_ratio = japan
            .iter()
            .flat_map(|j| usa.iter().map(|u| similarity_ratio(&j.base_name, &u.base_name)))
            .fold(0.0_f64, f64::max);

        let rule = match usa_japan_rule(distinct_stems(&bucket.members), max_ratio) {
            UsaJapanOutcome::RemoveJapan => CrossRegionalRule::UsaOverJapan { max_ratio },
            UsaJapanOutcome::RemoveJapanByGrouping => {
                log::debug!(
                    "{}: dissimilar names (ratio {:.2}) grouped together, trusting the grouping",
                    bucket.canonical_name,
                    max_ratio
                );
                CrossRegionalRule::UsaOverJapanByGrouping { max_ratio }
            }
            UsaJapanOutcome::KeepAll => {
                log::warn!(
                    "{}: low name similarity ({:.2}), keeping all versions",
                    bucket.canonical_name,
                    max_ratio
                );
                return BucketAnalysis::keep_all(BucketVerdict::LowConfidence { max_ratio });
            }
        };
        return remove_japan(japan, kept, rule);
    }

    if let (Some(&kept), false, true) = (europe.first(), japan.is_empty(), usa.is_empty()) {
        if policy.europe_supersedes_japan {
            return remove_japan(japan, kept, CrossRegionalRule::EuropeOverJapan);
        }
        log::debug!(
            "{}: keeping Japan release alongside Europe (no USA release)",
            bucket.canonical_name
        );
    }

    let mut decisions = Vec::new();
    for (region, files) in &regions {
        if files.len() < 2 {
            continue;
        }
        let best = best_variant(files);
        log::debug!(
            "{}: {} {} variants, keeping {}",
            bucket.canonical_name,
            files.len(),
            region,
            best.filename
        );
        decisions.extend(
            files
                .iter()
                .filter(|f| !std::ptr::eq(**f, best))
                .map(|f| Decision {
                    file: (*f).clone(),
                    reason: DecisionReason::SameRegionInferior,
                    kept_counterpart: best.clone(),
                }),
        );
    }

    BucketAnalysis {
        verdict: BucketVerdict::SameRegion,
        decisions,
    }
}

fn remove_japan(japan: &[&RomFile], kept: &RomFile, rule: CrossRegionalRule) -> BucketAnalysis {
    BucketAnalysis {
        verdict: BucketVerdict::CrossRegional { rule },
        decisions: japan
            .iter()
            .map(|f| Decision {
                file: (*f).clone(),
                reason: DecisionReason::CrossRegionalDuplicate,
                kept_counterpart: kept.clone(),
            })
            .collect(),
    }
}

/// Members grouped by region, regions in order of first appearance.
fn partition_by_region(members: &[RomFile]) -> Vec<(Region, Vec<&RomFile>)> {
    let mut regions: Vec<(Region, Vec<&RomFile>)> = Vec::new();
    for member in members {
        match regions.iter_mut().find(|(r, _)| *r == member.region) {
            Some((_, files)) => files.push(member),
            None => regions.push((member.region, vec![member])),
        }
    }
    regions
}

fn members_of<'a, 'b>(
    regions: &'b [(Region, Vec<&'a RomFile>)],
    region: Region,
) -> &'b [&'a RomFile] {
    regions
        .iter()
        .find(|(r, _)| *r == region)
        .map(|(_, files)| files.as_slice())
        .unwrap_or(&[])
}

fn distinct_stems(members: &[RomFile]) -> usize {
    let mut stems: Vec<String> = members.iter().map(|m| m.base_name.to_lowercase()).collect();
    stems.sort_unstable();
    stems.dedup();
    stems.len()
}

/// Highest-priority file; the earliest wins ties.
fn best_variant<'a>(files: &[&'a RomFile]) -> &'a RomFile {
    let mut best = files[0];
    let mut best_key = PriorityKey::from_filename(&best.filename);
    for &file in &files[1..] {
        let key = PriorityKey::from_filename(&file.filename);
        if key.cmp(&best_key) == Ordering::Greater {
            best = file;
            best_key = key;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(names: &[&str]) -> CanonicalBucket {
        CanonicalBucket::with_members(
            "game",
            names.iter().map(|n| RomFile::from_filename(n)).collect(),
        )
    }

    fn removed(decisions: &[Decision]) -> Vec<&str> {
        decisions.iter().map(|d| d.file.filename.as_str()).collect()
    }

    #[test]
    fn test_audit_trail_marks_each_member() {
        let bucket = bucket(&["Game (USA).zip", "Game (Japan).zip", "Game (Europe).zip"]);
        let analysis = analyze_bucket(&bucket, &DuplicatePolicy::default());
        assert_eq!(
            audit_trail(&bucket, &analysis),
            vec![
                ("KEEP", "Game (USA).zip"),
                ("REMOVE", "Game (Japan).zip"),
                ("KEEP", "Game (Europe).zip"),
            ]
        );
    }

    #[test]
    fn test_singleton_bucket() {
        let analysis = analyze_bucket(&bucket(&["Game (Japan).zip"]), &DuplicatePolicy::default());
        assert_eq!(analysis.verdict, BucketVerdict::Singleton);
        assert!(analysis.decisions.is_empty());
        assert!(resolve_bucket(&bucket(&[]), &DuplicatePolicy::default()).is_empty());
    }

    #[test]
    fn test_usa_beats_japan() {
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
    fn test_usa_japan_keeps_other_regions() {
        let analysis = analyze_bucket(
            &bucket(&[
                "Game (Japan).zip",
                "Game (Europe).zip",
                "Game (USA).zip",
                "Game (Japan) (Rev 1).zip",
                "Game (USA) (Beta).zip",
            ]),
            &DuplicatePolicy::default(),
        );
        assert!(matches!(
            analysis.verdict,
            BucketVerdict::CrossRegional {
                rule: CrossRegionalRule::UsaOverJapan { .. }
            }
        ));
        // Same-region handling does not run after a cross-regional rule.
        assert_eq!(
            removed(&analysis.decisions),
            vec!["Game (Japan).zip", "Game (Japan) (Rev 1).zip"]
        );
        assert!(analysis
            .decisions
            .iter()
            .all(|d| d.kept_counterpart.filename == "Game (USA).zip"));
    }

    #[test]
    fn test_dissimilar_names_trust_grouping() {
        let analysis = analyze_bucket(
            &bucket(&["Resident Evil (USA).bin", "Biohazard (Japan).bin"]),
            &DuplicatePolicy::default(),
        );
        assert!(matches!(
            analysis.verdict,
            BucketVerdict::CrossRegional {
                rule: CrossRegionalRule::UsaOverJapanByGrouping { .. }
            }
        ));
        assert_eq!(removed(&analysis.decisions), vec!["Biohazard (Japan).bin"]);
    }

    #[test]
    fn test_usa_japan_rule_branches() {
        assert_eq!(usa_japan_rule(1, 0.9), UsaJapanOutcome::RemoveJapan);
        assert_eq!(usa_japan_rule(3, 0.6), UsaJapanOutcome::RemoveJapan);
        assert_eq!(usa_japan_rule(2, 0.3), UsaJapanOutcome::RemoveJapanByGrouping);
        assert_eq!(usa_japan_rule(1, 0.59), UsaJapanOutcome::KeepAll);
    }

    #[test]
    fn test_europe_beats_japan_without_usa() {
        let decisions = resolve_bucket(
            &bucket(&["Game (Japan).zip", "Game (Europe).zip", "Game (World).zip"]),
            &DuplicatePolicy::default(),
        );
        assert_eq!(removed(&decisions), vec!["Game (Japan).zip"]);
        assert_eq!(decisions[0].kept_counterpart.filename, "Game (Europe).zip");
    }

    #[test]
    fn test_japan_kept_without_usa_when_policy_disabled() {
        let policy = DuplicatePolicy {
            europe_supersedes_japan: false,
        };
        let analysis = analyze_bucket(&bucket(&["Game (Japan).zip", "Game (Europe).zip"]), &policy);
        assert_eq!(analysis.verdict, BucketVerdict::SameRegion);
        assert!(analysis.decisions.is_empty());
    }

    #[test]
    fn test_japan_only_bucket_is_same_region() {
        let decisions = resolve_bucket(
            &bucket(&["Game (Japan).zip", "Game (Japan) (Rev 1).zip"]),
            &DuplicatePolicy::default(),
        );
        assert_eq!(removed(&decisions), vec!["Game (Japan).zip"]);
        assert_eq!(decisions[0].reason, DecisionReason::SameRegionInferior);
    }

    #[test]
    fn test_same_region_format_priority() {
        let decisions = resolve_bucket(
            &bucket(&["Game (USA).zip", "Game (USA).cue", "Game (USA) (Rev 1).bin"]),
            &DuplicatePolicy::default(),
        );
        assert_eq!(removed(&decisions), vec!["Game (USA).cue", "Game (USA) (Rev 1).bin"]);
        assert!(decisions
            .iter()
            .all(|d| d.kept_counterpart.filename == "Game (USA).zip"
                && d.reason == DecisionReason::SameRegionInferior));
    }

    #[test]
    fn test_revision_tie_break() {
        let decisions = resolve_bucket(
            &bucket(&["Game (USA) (Rev 1).zip", "Game (USA) (Rev 2).zip"]),
            &DuplicatePolicy::default(),
        );
        assert_eq!(removed(&decisions), vec!["Game (USA) (Rev 1).zip"]);
        assert_eq!(decisions[0].kept_counterpart.filename, "Game (USA) (Rev 2).zip");
    }

    #[test]
    fn test_identical_priority_keeps_first_discovered() {
        let decisions = resolve_bucket(
            &bucket(&["Game (USA) [a].zip", "Game (USA) [b].zip"]),
            &DuplicatePolicy::default(),
        );
        assert_eq!(removed(&decisions), vec!["Game (USA) [b].zip"]);
    }

    #[test]
    fn test_edition_priority() {
        let decisions = resolve_bucket(
            &bucket(&[
                "Game (Japan) (Beta).zip",
                "Game (Japan) (Limited Edition).zip",
                "Game (Japan).zip",
            ]),
            &DuplicatePolicy::default(),
        );
        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].kept_counterpart.filename, "Game (Japan).zip");
    }

    #[test]
    fn test_regions_resolved_independently() {
        let decisions = resolve_bucket(
            &bucket(&[
                "Game (USA).cue",
                "Game (Europe).zip",
                "Game (USA).zip",
                "Game (Europe).bin",
            ]),
            &DuplicatePolicy::default(),
        );
        assert_eq!(removed(&decisions), vec!["Game (USA).cue", "Game (Europe).bin"]);
    }

    #[test]
    fn test_multi_part_bucket_untouched() {
        let analysis = analyze_bucket(
            &bucket(&[
                "Game (USA) (Disc 1).bin",
                "Game (USA) (Disc 2).bin",
                "Game (Japan) (Disc 1).bin",
            ]),
            &DuplicatePolicy::default(),
        );
        assert_eq!(analysis.verdict, BucketVerdict::MultiPart);
        assert!(analysis.decisions.is_empty());
    }

    #[test]
    fn test_priority_key() {
        let key = PriorityKey::from_filename("Game (USA) (Rev 3).ZIP");
        assert_eq!(
            key,
            PriorityKey {
                format: 3,
                edition: 3,
                revision: 3
            }
        );
        // Dev keywords outrank special keywords.
        assert_eq!(
            PriorityKey::from_filename("Game (Special Demo).bin").edition,
            1
        );
        assert_eq!(PriorityKey::from_filename("Game (Premium).iso").edition, 2);
        assert_eq!(PriorityKey::from_filename("Game.iso").format, 0);
    }

    #[test]
    fn test_is_kept() {
        let b = bucket(&["Game (USA).zip", "Game (Japan).zip"]);
        let analysis = analyze_bucket(&b, &DuplicatePolicy::default());
        assert!(analysis.is_kept(&b.members[0]));
        assert!(!analysis.is_kept(&b.members[1]));
    }
}
