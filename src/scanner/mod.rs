//! Scanner module for ROM discovery.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Extension filtering against the ROM extension table
//! - Skipping quarantine folders such as `to_delete`
//! - Unicode normalization of display filenames
//!
//! # Example
//!
//! ```no_run
//! use romdedupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("roms"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(rom) => println!("{} ({})", rom.filename, rom.region),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod extensions;
pub mod walker;

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::parser::{self, Region};
use crate::resolver::PlatformHint;

pub use extensions::{extension_set, normalize_extension, DEFAULT_EXTENSIONS};
pub use walker::Walker;

/// One discovered ROM file with its parsed attributes.
///
/// Immutable once built; discovery order is preserved by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RomFile {
    /// Path to the file
    pub path: PathBuf,
    /// Display filename (NFC), the sole input to parsing
    pub filename: String,
    /// Detected region
    pub region: Region,
    /// Base title, disc markers kept
    pub base_name: String,
    /// Revision and edition markers
    pub version_info: String,
}

impl RomFile {
    /// Build a ROM file from a path, parsing its filename.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|n| normalize_filename(&n.to_string_lossy()).into_owned())
            .unwrap_or_default();
        Self::with_filename(path, filename)
    }

    /// Build a ROM file whose path is just its filename.
    #[must_use]
    pub fn from_filename(filename: &str) -> Self {
        Self::new(PathBuf::from(filename))
    }

    fn with_filename(path: PathBuf, filename: String) -> Self {
        let parsed = parser::parse(&filename);
        Self {
            path,
            filename,
            region: parsed.region,
            base_name: parsed.base_name,
            version_info: parsed.version_info,
        }
    }

    /// Lowercase extension with leading dot.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        parser::extension(&self.filename)
    }

    /// Platform hint for resolution (the file extension).
    #[must_use]
    pub fn platform_hint(&self) -> Option<PlatformHint> {
        PlatformHint::from_filename(&self.filename)
    }

    /// Whether the filename carries a disc/part marker.
    #[must_use]
    pub fn has_disc_marker(&self) -> bool {
        parser::has_disc_marker(&self.filename)
    }
}

/// Normalize a filename to NFC so NFD names (macOS) parse identically.
#[must_use]
pub fn normalize_filename(name: &str) -> Cow<'_, str> {
    if unicode_normalization::is_nfc(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.nfc().collect())
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Accepted extensions, lowercase with leading dot.
    pub extensions: BTreeSet<String>,

    /// Directory names never descended into.
    pub skip_dirs: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            skip_hidden: true,
            extensions: extension_set::<&str>(&[]),
            skip_dirs: vec!["to_delete".to_string()],
        }
    }
}

impl WalkerConfig {
    /// Add extra accepted extensions.
    #[must_use]
    pub fn with_extra_extensions<S: AsRef<str>>(mut self, extra: &[S]) -> Self {
        self.extensions
            .extend(extra.iter().filter_map(|e| normalize_extension(e.as_ref())));
        self
    }

    /// Replace the skipped directory names.
    #[must_use]
    pub fn with_skip_dirs(mut self, dirs: Vec<String>) -> Self {
        self.skip_dirs = dirs;
        self
    }

    /// Set symlink following.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set hidden-file skipping.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Whether a filename has an accepted extension.
    #[must_use]
    pub fn accepts(&self, filename: &str) -> bool {
        parser::extension(filename).is_some_and(|ext| self.extensions.contains(&ext))
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
