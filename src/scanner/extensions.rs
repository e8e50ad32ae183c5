//! Recognized ROM file extensions.

use std::collections::BTreeSet;

/// Extensions scanned by default, lowercase with a leading dot.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    // Archives
    ".zip", ".7z", ".rar",
    // Nintendo
    ".nes", ".snes", ".smc", ".sfc", ".gb", ".gbc", ".gba", ".nds", ".3ds", ".cia", ".n64",
    ".z64", ".v64", ".ndd", ".gcm", ".gcz", ".rvz", ".wbfs", ".xci", ".nsp", ".vb", ".lnx",
    ".ngp", ".ngc",
    // Sega
    ".md", ".gen", ".smd", ".gg", ".sms", ".32x", ".sat", ".gdi",
    // Sony and disc images
    ".bin", ".iso", ".cue", ".chd", ".pbp", ".cso", ".ciso",
    // PC Engine
    ".pce", ".sgx",
    // Atari
    ".a26", ".a78", ".st", ".d64",
    // Other consoles
    ".col", ".int", ".vec", ".ws", ".wsc",
    // Disk images
    ".img", ".ima", ".dsk", ".adf", ".mdf", ".nrg",
    // Tape and snapshot formats
    ".tap", ".tzx", ".sna", ".z80",
];

/// Normalize a user-supplied extension: trimmed, lowercase, leading dot.
///
/// Returns `None` for blank input.
#[must_use]
pub fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        None
    } else {
        Some(format!(".{}", ext.to_lowercase()))
    }
}

/// The default extension set plus any extras.
#[must_use]
pub fn extension_set<S: AsRef<str>>(extra: &[S]) -> BTreeSet<String> {
    DEFAULT_EXTENSIONS
        .iter()
        .map(|e| (*e).to_string())
        .chain(extra.iter().filter_map(|e| normalize_extension(e.as_ref())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_normalized() {
        for ext in DEFAULT_EXTENSIONS {
            assert_eq!(normalize_extension(ext).as_deref(), Some(*ext));
        }
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("ZIP").as_deref(), Some(".zip"));
        assert_eq!(normalize_extension(" .Foo ").as_deref(), Some(".foo"));
        assert_eq!(normalize_extension(""), None);
        assert_eq!(normalize_extension("."), None);
    }

    #[test]
    fn test_extension_set_adds_extras() {
        let set = extension_set(&["ROM", "zip", ""]);
        assert!(set.contains(".rom"));
        assert!(set.contains(".zip"));
        assert!(set.contains(".cue"));
        assert_eq!(set.len(), DEFAULT_EXTENSIONS.len() + 1);
    }
}
