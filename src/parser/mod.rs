//! Filename parsing for ROM files.
//!
//! Turns a single display filename into the structured attributes the rest
//! of the pipeline works with: the distribution [`Region`], the base title
//! used for grouping, and advisory version/edition info.
//!
//! Parsing is total: any input, including an empty string, yields a
//! [`ParsedName`]. Unrecognized filenames get [`Region::Unknown`].
//!
//! # Base names and disc markers
//!
//! Stripping is lossy for region, revision and edition tags but lossless for
//! disc/part markers. A disc marker is captured before the generic bracket
//! pass and reattached at the end, so multi-disc detection downstream still
//! sees it.
//!
//! # Example
//!
//! ```
//! use romdedupe::parser::{parse, Region};
//!
//! let parsed = parse("Final Fantasy IX (USA) (Disc 1) (Rev 1).bin");
//! assert_eq!(parsed.region, Region::Usa);
//! assert_eq!(parsed.base_name, "Final Fantasy IX (Disc 1)");
//! assert_eq!(parsed.version_info, "Rev 1");
//! ```

pub mod patterns;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use patterns::{DEV_BUILD_KEYWORDS, SPECIAL_EDITION_KEYWORDS};

/// Intended distribution territory encoded in a ROM filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// North American release.
    Usa,
    /// European release.
    Europe,
    /// Japanese release.
    Japan,
    /// Region-free release.
    World,
    /// No recognizable regional marker.
    Unknown,
}

impl Region {
    /// Lowercase name used in logs and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Usa => "usa",
            Self::Europe => "europe",
            Self::Japan => "japan",
            Self::World => "world",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured attributes extracted from one filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
    /// Detected region.
    pub region: Region,
    /// Title with region/revision/edition tags stripped, disc markers kept.
    pub base_name: String,
    /// Revision and edition markers in encounter order, space-joined.
    pub version_info: String,
}

/// Parse a filename into region, base name and version info.
#[must_use]
pub fn parse(filename: &str) -> ParsedName {
    ParsedName {
        region: detect_region(filename),
        base_name: base_name(filename),
        version_info: version_info(filename),
    }
}

/// Detect the region of a filename.
///
/// Regions are tried in table order (japan, usa, europe, world); the first
/// region with any matching marker wins.
#[must_use]
pub fn detect_region(filename: &str) -> Region {
    patterns::REGION_TABLE
        .iter()
        .find(|(_, pattern)| pattern.is_match(filename))
        .map_or(Region::Unknown, |(region, _)| *region)
}

/// Whether the filename carries a disc/part marker such as `(Disc 2)`.
#[must_use]
pub fn has_disc_marker(filename: &str) -> bool {
    patterns::DISC_MARKER.is_match(filename)
}

/// Lowercase extension including the leading dot, if the name has one.
///
/// Only a short alphanumeric suffix counts, so titles such as
/// `Super Mario Bros.` or `Dr. Mario (USA)` are not mistaken for extensions.
#[must_use]
pub fn extension(filename: &str) -> Option<String> {
    split_extension(filename).1.map(|ext| format!(".{}", ext.to_lowercase()))
}

fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, Some(ext))
        }
        _ => (filename, None),
    }
}

/// Extract the base title used for grouping.
///
/// Strips the extension, every bracketed token, bare version words and a
/// trailing `- N` suffix, collapses whitespace, then reattaches the first
/// disc/part marker.
#[must_use]
pub fn base_name(filename: &str) -> String {
    let (stem, _) = split_extension(filename);

    // The disc marker must come out before the generic bracket pass.
    let mut disc_marker = None;
    let mut base = stem.to_string();
    if let Some(m) = patterns::DISC_MARKER.find(stem) {
        disc_marker = Some(m.as_str().trim().to_string());
        base.replace_range(m.range(), "");
    }

    let base = patterns::BRACKETED.replace_all(&base, "");
    let base = patterns::BARE_VERSION.replace_all(&base, "");
    let base = patterns::TRAILING_NUMBER.replace(&base, "");
    let mut base = patterns::WHITESPACE
        .replace_all(&base, " ")
        .trim()
        .to_string();

    if base.is_empty() {
        log::trace!("Base name of {:?} stripped to nothing, keeping stem", filename);
        base = patterns::WHITESPACE
            .replace_all(stem, " ")
            .trim()
            .to_string();
        return base;
    }

    if let Some(marker) = disc_marker {
        base.push(' ');
        base.push_str(&marker);
    }
    base
}

/// Collect revision and edition markers from the original filename.
///
/// Every parenthesized revision tag and the first tag of each edition family
/// are returned without their parentheses, ordered by position and joined
/// by spaces. Empty when none are present.
#[must_use]
pub fn version_info(filename: &str) -> String {
    let mut found: Vec<(usize, &str)> = patterns::REVISION_TAG
        .find_iter(filename)
        .map(|m| (m.start(), m.as_str()))
        .collect();

    for pattern in patterns::EDITION_TAGS.iter() {
        if let Some(m) = pattern.find(filename) {
            found.push((m.start(), m.as_str()));
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found
        .into_iter()
        .map(|(_, tag)| tag.trim_matches(|c| c == '(' || c == ')'))
        .collect::<Vec<_>>()
        .join(" ")
}
