//! Platform hints derived from file extensions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lookup-service platform ids per extension.
const PLATFORM_IDS: &[(&str, &[u32])] = &[
    // Nintendo
    (".nes", &[18]),
    (".snes", &[19]),
    (".smc", &[19]),
    (".sfc", &[19]),
    (".gb", &[33]),
    (".gbc", &[22]),
    (".gba", &[24]),
    (".nds", &[20]),
    (".3ds", &[37]),
    (".cia", &[37]),
    (".n64", &[4]),
    (".z64", &[4]),
    (".v64", &[4]),
    (".ndd", &[4]),
    (".gcm", &[21]),
    (".gcz", &[21]),
    (".rvz", &[5, 21]),
    (".wbfs", &[5]),
    (".xci", &[130]),
    (".nsp", &[130]),
    (".vb", &[87]),
    (".lnx", &[28]),
    (".ngp", &[119]),
    (".ngc", &[120]),
    // Sega
    (".md", &[29]),
    (".gen", &[29]),
    (".smd", &[29]),
    (".gg", &[35]),
    (".sms", &[64]),
    (".32x", &[30]),
    (".sat", &[32]),
    (".gdi", &[23]),
    // Sony and generic disc images
    (".iso", &[7, 8, 9, 21, 38, 39]),
    (".bin", &[7, 8, 9, 27, 38, 39]),
    (".cue", &[7, 8, 9, 27, 38, 39]),
    (".chd", &[7, 8, 9, 27, 38, 39]),
    (".pbp", &[7, 8]),
    (".cso", &[7, 8]),
    (".ciso", &[8, 21]),
    (".mdf", &[8, 38, 39]),
    (".nrg", &[8, 38, 39]),
    // PC Engine
    (".pce", &[86]),
    (".sgx", &[86]),
    // Atari
    (".a26", &[59]),
    (".a78", &[60]),
    (".st", &[63]),
    // Other
    (".col", &[68]),
    (".int", &[67]),
    (".vec", &[70]),
    (".ws", &[57]),
    (".wsc", &[57]),
];

/// Platform context passed alongside a title to the resolver.
///
/// The hint is the lowercase file extension with its leading dot
/// (e.g. `.gba`). It is part of the resolver cache key and, for lookups,
/// maps to the service's numeric platform ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformHint(String);

impl PlatformHint {
    /// Build a hint from an extension, with or without the leading dot.
    ///
    /// Returns `None` for an empty extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if ext.is_empty() {
            None
        } else {
            Some(Self(format!(".{ext}")))
        }
    }

    /// Build a hint from a filename's extension.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        crate::parser::extension(filename).and_then(|ext| Self::from_extension(&ext))
    }

    /// The hint as it appears in cache keys.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Platform ids for this extension, empty when the extension is generic.
    #[must_use]
    pub fn platform_ids(&self) -> &'static [u32] {
        PLATFORM_IDS
            .iter()
            .find(|(ext, _)| *ext == self.0)
            .map(|(_, ids)| *ids)
            .unwrap_or_default()
    }
}

impl fmt::Display for PlatformHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
