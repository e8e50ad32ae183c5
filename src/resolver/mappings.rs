//! Built-in table of well-known regional retitlings.
//!
//! [`LocalMappings`] answers like any other [`CanonicalLookup`]: a regional
//! title comes back as an annotated alternate name of the canonical game, so
//! it goes through the same scoring and caching as an external result. Only
//! exact title matches are answered; everything else is left to later
//! lookups and the fuzzy fallback.

use std::collections::HashMap;

use super::cache::normalize;
use super::lookup::{Candidate, CanonicalLookup, LookupError};
use super::platform::PlatformHint;

/// (regional title, canonical title, annotation)
const REGIONAL_TITLES: &[(&str, &str, &str)] = &[
    ("biohazard", "resident evil", "japanese title"),
    ("biohazard 2", "resident evil 2", "japanese title"),
    ("biohazard 3", "resident evil 3", "japanese title"),
    ("rockman", "mega man", "japanese title"),
    ("rockman x", "mega man x", "japanese title"),
    ("rockman 2", "mega man 2", "japanese title"),
    ("rockman 3", "mega man 3", "japanese title"),
    ("rockman 4", "mega man 4", "japanese title"),
    ("rockman 5", "mega man 5", "japanese title"),
    ("rockman 6", "mega man 6", "japanese title"),
    ("street fighter zero", "street fighter alpha", "japanese title"),
    ("street fighter zero 2", "street fighter alpha 2", "japanese title"),
    ("street fighter zero 3", "street fighter alpha 3", "japanese title"),
    ("seiken densetsu", "final fantasy adventure", "japanese title"),
    ("seiken densetsu 2", "secret of mana", "japanese title"),
    ("seiken densetsu 3", "trials of mana", "japanese title"),
    ("dragon quest", "dragon warrior", "japanese title"),
    ("dragon quest ii", "dragon warrior ii", "japanese title"),
    ("dragon quest iii", "dragon warrior iii", "japanese title"),
    ("dragon quest iv", "dragon warrior iv", "japanese title"),
    ("mario no super picross", "mario's super picross", "japanese title"),
    ("zelda no densetsu", "the legend of zelda", "japanese title"),
    ("akumajou dracula", "castlevania", "japanese title"),
    ("akumajou dracula x", "castlevania dracula x", "japanese title"),
    ("probotector", "contra", "europe title"),
    ("nemesis", "gradius", "europe title"),
    ("puyo pop", "puyo puyo", "international title"),
    ("dyna blaster", "bomberman", "europe title"),
    ("puck man", "pac-man", "japanese title"),
    ("winning eleven", "pro evolution soccer", "japanese title"),
    ("jikkyou powerful pro yakyuu", "power pros", "japanese title"),
];

/// Lookup backed by the built-in regional title table.
#[derive(Debug, Clone)]
pub struct LocalMappings {
    /// Normalized title → indices into the table.
    index: HashMap<String, Vec<usize>>,
}

impl Default for LocalMappings {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalMappings {
    /// Build the lookup from the built-in table.
    #[must_use]
    pub fn new() -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, (regional, canonical, _)) in REGIONAL_TITLES.iter().enumerate() {
            index.entry(normalize(regional)).or_default().push(i);
            index.entry(normalize(canonical)).or_default().push(i);
        }
        Self { index }
    }

    /// Number of regional retitlings known.
    #[must_use]
    pub fn len(&self) -> usize {
        REGIONAL_TITLES.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        REGIONAL_TITLES.is_empty()
    }
}

impl CanonicalLookup for LocalMappings {
    fn name(&self) -> &str {
        "local-mappings"
    }

    fn lookup(
        &self,
        title: &str,
        _platform: Option<&PlatformHint>,
    ) -> Result<Vec<Candidate>, LookupError> {
        let Some(rows) = self.index.get(&normalize(title)) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .iter()
            .map(|&i| {
                let (regional, canonical, annotation) = REGIONAL_TITLES[i];
                Candidate::new(canonical).with_alternate(regional, annotation)
            })
            .collect())
    }
}
