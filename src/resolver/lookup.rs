//! External canonical-name lookups and candidate scoring.
//!
//! A [`CanonicalLookup`] returns raw [`Candidate`]s for a title; the resolver
//! scores them with [`best_candidate`] and accepts at most one.
//!
//! # Scoring
//!
//! Every name of a candidate (its main name and each alternate name) is
//! compared with the queried title. The score is the similarity ratio plus:
//!
//! - a platform bonus of `0.2` when the candidate lists one of the hinted
//!   platform ids,
//! - a cross-language bonus for alternate names: `0.3` when the annotation
//!   names a region or language, otherwise `0.2` when the names are related
//!   but different (they share meaningful words, or the alternate is a
//!   well-known regional retitling).
//!
//! A main-name match must reach a ratio of `0.65`. An alternate-name match
//! must reach `0.3`, or `0.2` when a cross-language bonus applied. The best
//! accepted score wins and resolves to the candidate's main name.

use serde::{Deserialize, Serialize};

use super::platform::PlatformHint;
use super::similarity::similarity_ratio;

/// Minimum ratio for a match on a candidate's main name.
pub const DIRECT_MATCH_THRESHOLD: f64 = 0.65;
/// Minimum ratio for a match on an alternate name.
pub const ALTERNATE_MATCH_THRESHOLD: f64 = 0.3;
/// Minimum ratio for an alternate-name match with a cross-language bonus.
pub const CROSS_LANGUAGE_MATCH_THRESHOLD: f64 = 0.2;

const PLATFORM_BONUS: f64 = 0.2;
const ANNOTATION_BONUS: f64 = 0.3;
const SHARED_WORDS_BONUS: f64 = 0.2;

/// Annotation words that mark an alternate name as a regional variant.
const REGIONAL_INDICATORS: &[&str] = &[
    "japanese",
    "japan",
    "english",
    "us",
    "usa",
    "europe",
    "eur",
    "localized",
    "translation",
    "regional",
    "international",
];

/// Words that carry no identity when comparing titles.
const STOPWORDS: &[&str] = &[
    "the",
    "and",
    "or",
    "of",
    "in",
    "on",
    "at",
    "to",
    "for",
    "with",
    "by",
    "collection",
    "characters",
    "special",
    "edition",
    "version",
    "vol",
    "volume",
    "disc",
    "cd",
    "dvd",
    "game",
    "games",
    "series",
    "complete",
    "deluxe",
];

/// Fragments of well-known regional retitlings.
const RETITLE_FRAGMENTS: &[&str] = &["biohazard", "rockman", "street fighter"];

/// Errors a lookup backend may report.
///
/// The resolver treats every variant as "no candidates"; they never reach
/// the caller of [`super::CanonicalResolver::resolve`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The backend is not usable (missing credentials, rejected request).
    #[error("Lookup service unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request because of rate limiting.
    #[error("Lookup service rate limit exceeded")]
    RateLimited,

    /// A transient transport failure.
    #[error("Lookup transport error: {0}")]
    Transport(String),
}

impl LookupError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Transport(_))
    }
}

/// Alternate title of a candidate, with its free-text annotation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlternateName {
    /// The alternate title.
    pub name: String,
    /// Annotation such as "Japanese title" (may be empty).
    pub annotation: String,
}

impl AlternateName {
    /// Create an alternate name.
    pub fn new(name: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: annotation.into(),
        }
    }
}

/// One game returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Candidate {
    /// Main (canonical) name.
    pub name: String,
    /// Regional and alternate titles.
    pub alternate_names: Vec<AlternateName>,
    /// Platform ids the game was released on.
    pub platform_ids: Vec<u32>,
}

impl Candidate {
    /// Create a candidate with no alternates or platforms.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an alternate name.
    #[must_use]
    pub fn with_alternate(mut self, name: impl Into<String>, annotation: impl Into<String>) -> Self {
        self.alternate_names.push(AlternateName::new(name, annotation));
        self
    }

    /// Set the platform ids.
    #[must_use]
    pub fn with_platforms(mut self, ids: Vec<u32>) -> Self {
        self.platform_ids = ids;
        self
    }
}

/// A source of canonical-name candidates.
///
/// Implementations must be shareable across worker threads. Returning
/// `Ok(vec![])` and returning an error are treated the same by the resolver.
pub trait CanonicalLookup: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Look up candidates for a title.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the backend cannot answer.
    fn lookup(
        &self,
        title: &str,
        platform: Option<&PlatformHint>,
    ) -> Result<Vec<Candidate>, LookupError>;
}

/// Which name of a candidate produced the accepted match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// The candidate's main name.
    Direct,
    /// One of its alternate names.
    Alternate,
}

/// The accepted match for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    /// Main name of the matched candidate.
    pub canonical_name: String,
    /// The name the query actually matched.
    pub matched_on: String,
    /// Which kind of name matched.
    pub match_type: MatchType,
    /// Raw ratio plus bonuses.
    pub score: f64,
    /// Whether a cross-language bonus applied.
    pub cross_language: bool,
}

/// Score one candidate, returning its best accepted name if any.
#[must_use]
pub fn score_candidate(
    title: &str,
    candidate: &Candidate,
    platform: Option<&PlatformHint>,
) -> Option<ScoredMatch> {
    let targets = platform.map(PlatformHint::platform_ids).unwrap_or_default();
    let platform_bonus = if candidate.platform_ids.iter().any(|id| targets.contains(id)) {
        PLATFORM_BONUS
    } else {
        0.0
    };

    let mut best: Option<ScoredMatch> = None;
    let mut consider = |name: &str, match_type: MatchType, ratio: f64, bonus: f64| {
        let score = ratio + platform_bonus + bonus;
        if best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(ScoredMatch {
                canonical_name: candidate.name.clone(),
                matched_on: name.to_string(),
                match_type,
                score,
                cross_language: bonus > 0.0,
            });
        }
    };

    let ratio = similarity_ratio(title, &candidate.name);
    if ratio >= DIRECT_MATCH_THRESHOLD {
        consider(&candidate.name, MatchType::Direct, ratio, 0.0);
    }

    for alt in &candidate.alternate_names {
        let ratio = similarity_ratio(title, &alt.name);
        let bonus = cross_language_bonus(title, alt, ratio);
        let threshold = if bonus > 0.0 {
            CROSS_LANGUAGE_MATCH_THRESHOLD
        } else {
            ALTERNATE_MATCH_THRESHOLD
        };
        if ratio >= threshold {
            consider(&alt.name, MatchType::Alternate, ratio, bonus);
        }
    }

    best
}

/// Pick the best accepted match across all candidates.
///
/// Ties keep the earlier candidate.
#[must_use]
pub fn best_candidate(
    title: &str,
    candidates: &[Candidate],
    platform: Option<&PlatformHint>,
) -> Option<ScoredMatch> {
    candidates
        .iter()
        .filter_map(|c| score_candidate(title, c, platform))
        .fold(None, |best: Option<ScoredMatch>, m| match best {
            Some(b) if b.score >= m.score => Some(b),
            _ => Some(m),
        })
}

fn cross_language_bonus(title: &str, alt: &AlternateName, ratio: f64) -> f64 {
    let annotation = alt.annotation.to_lowercase();
    let mut bonus = 0.0;
    if words(&annotation).any(|w| REGIONAL_INDICATORS.contains(&w)) {
        bonus = ANNOTATION_BONUS;
    }

    // Related but clearly different names.
    if ratio > 0.1 && ratio < 0.4 {
        let title_lower = title.to_lowercase();
        let alt_lower = alt.name.to_lowercase();
        let title_words = meaningful_words(&title_lower);
        let alt_words = meaningful_words(&alt_lower);
        let overlap = title_words.iter().filter(|w| alt_words.contains(w)).count();
        let retitled = RETITLE_FRAGMENTS.iter().any(|f| alt_lower.contains(f));
        if (overlap >= 2 && title_words.len() >= 2) || retitled {
            bonus = SHARED_WORDS_BONUS;
        }
    }
    bonus
}

fn words(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty())
}

fn meaningful_words(s: &str) -> Vec<&str> {
    let mut out: Vec<&str> = s
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(w))
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}
