//! Compiled regular expressions and keyword tables for filename parsing.
//!
//! All patterns are compiled once on first use. They are statically valid,
//! so compilation cannot fail at runtime.

use std::sync::LazyLock;

use regex::Regex;

use super::Region;

fn compile(pattern: &str) -> Regex {
    // Patterns in this module are literals covered by unit tests.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Regional marker patterns in table order.
///
/// The first region in this table with a matching marker wins, regardless
/// of where the marker appears in the filename.
pub(crate) static REGION_TABLE: LazyLock<Vec<(Region, Regex)>> = LazyLock::new(|| {
    vec![
        (
            Region::Japan,
            compile(r"(?i)\((?:J|Japan|JP|JPN)\)|\[(?:J|Japan)\]"),
        ),
        (
            Region::Usa,
            compile(r"(?i)\((?:U|USA|US)\)|\[(?:U|USA|US)\]"),
        ),
        (
            Region::Europe,
            compile(r"(?i)\((?:E|Europe|EUR)\)|\[(?:E|Europe|EUR)\]"),
        ),
        (Region::World, compile(r"(?i)\((?:W|World)\)|\[(?:W|World)\]")),
    ]
});

/// Disc/part marker, including any leading whitespace.
pub(crate) static DISC_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\s*\((?:Disc|Disk|CD|Part)\s*\d+[^)]*\)"));

/// Any parenthesized or bracketed token, including leading whitespace.
pub(crate) static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\s*(?:\([^)]*\)|\[[^\]]*\])"));

/// Bare version words left outside brackets ("Version 3", "v2.0", "Rev 2").
pub(crate) static BARE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\s+(?:Version\s+\d+(?:\.\d+)*|Rev\s+\d+|v\d+(?:\.\d+)+)\b")
});

/// Trailing "- N" numeric suffix.
pub(crate) static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\s*-\s*\d+\s*$"));

pub(crate) static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));

/// Parenthesized revision marker, used for version info.
pub(crate) static REVISION_TAG: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\((?:Rev|Version|Ver|v)\s*\d+[^)]*\)"));

/// Parenthesized edition markers, used for version info.
pub(crate) static EDITION_TAGS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(
            r"(?i)\((?:Gentei Set|Limited Edition|Special Edition|Premium|Collectors|Deluxe)[^)]*\)",
        ),
        compile(r"(?i)\((?:Beta|Proto|Demo|Sample|Taikenban)[^)]*\)"),
        compile(r"(?i)\((?:Value Plus|Greatest Hits|Platinum)[^)]*\)"),
    ]
});

/// Revision number anywhere in a lowercased filename ("rev 2", "rev2").
pub(crate) static REVISION_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"rev\s*(\d+)"));

/// Keywords marking a special/limited/premium edition.
pub const SPECIAL_EDITION_KEYWORDS: &[&str] =
    &["limited", "premium", "special", "genteiban", "shokai"];

/// Keywords marking a development or promotional build.
pub const DEV_BUILD_KEYWORDS: &[&str] = &["beta", "proto", "demo", "sample", "taikenban"];
