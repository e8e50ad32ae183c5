//! Title similarity and the local fuzzy fallback.
//!
//! Similarity is the normalized Levenshtein ratio over lowercased strings,
//! in `0.0..=1.0`. The fuzzy fallback compares a title against previously
//! resolved canonical names and refuses to merge titles whose sequel
//! numbers differ.

/// Minimum ratio (exclusive) for a fuzzy fallback match.
pub const FUZZY_THRESHOLD: f64 = 0.75;

/// Similarity ratio between two titles, ignoring case.
#[must_use]
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Standalone sequel numbers in a title, in order.
///
/// Integer tokens are kept as written (leading zeros dropped). Roman numerals
/// from I to XXXIX count only in their canonical spelling and are converted
/// to decimal, so `II` and `2` compare equal while `II` and `III` do not.
#[must_use]
pub fn sequel_tokens(title: &str) -> Vec<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            if token.chars().all(|c| c.is_ascii_digit()) {
                let trimmed = token.trim_start_matches('0');
                Some(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
            } else {
                roman_value(token).map(|n| n.to_string())
            }
        })
        .collect()
}

/// Whether two titles may be merged by the fuzzy fallback.
///
/// When either title carries a sequel number, both must carry the same list.
#[must_use]
pub fn sequel_guard(a: &str, b: &str) -> bool {
    let left = sequel_tokens(a);
    let right = sequel_tokens(b);
    (left.is_empty() && right.is_empty()) || left == right
}

/// Best fuzzy match for `title` among `candidates`.
///
/// A candidate qualifies when its ratio exceeds [`FUZZY_THRESHOLD`] and it
/// passes the [`sequel_guard`]. Among qualifying candidates the highest ratio
/// wins; ties go to the earliest candidate, so callers wanting determinism
/// should pass candidates in a stable order.
pub fn fuzzy_match<'a, I>(title: &str, candidates: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let ratio = similarity_ratio(title, candidate);
        if ratio <= FUZZY_THRESHOLD || !sequel_guard(title, candidate) {
            continue;
        }
        if best.is_none_or(|(_, best_ratio)| ratio > best_ratio) {
            best = Some((candidate, ratio));
        }
    }
    best
}

fn roman_value(token: &str) -> Option<u32> {
    if token.len() > 6 || !token.chars().all(|c| matches!(c, 'i' | 'v' | 'x' | 'I' | 'V' | 'X')) {
        return None;
    }
    let upper = token.to_ascii_uppercase();
    (1..40).find(|&n| to_roman(n) == upper)
}

fn to_roman(mut n: u32) -> String {
    const DIGITS: &[(u32, &str)] = &[(10, "X"), (9, "IX"), (5, "V"), (4, "IV"), (1, "I")];
    let mut out = String::new();
    for &(value, digits) in DIGITS {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}
