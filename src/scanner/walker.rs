//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! [`Walker`] discovers ROM files under a root directory. Children of every
//! directory are sorted by name, so discovery order is stable across runs
//! and platforms. Directories named in [`WalkerConfig::skip_dirs`] are pruned
//! before they are read.
//!
//! Per-entry failures (permission denied, vanished files) are yielded as
//! [`ScanError`] values rather than stopping iteration.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{RomFile, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for parallel ROM discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback, told about every accepted file
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set, iteration stops at the next entry.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the directory tree, yielding ROM files in discovery order.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use romdedupe::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// let roms: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    /// println!("Found {} ROMs", roms.len());
    /// ```
    pub fn walk(&self) -> impl Iterator<Item = Result<RomFile, ScanError>> + '_ {
        let skip_dirs = self.config.skip_dirs.clone();
        let mut discovered = 0usize;

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Prune quarantine folders before they are read.
                children.retain(|child| match child {
                    Ok(entry) => {
                        let name = entry.file_name().to_string_lossy();
                        !(entry.file_type().is_dir() && is_skipped(&name, &skip_dirs))
                    }
                    Err(_) => true,
                });
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    return Some(self.handle_jwalk_error(path, e));
                }
            };

            let path = entry.path();
            if path == self.root || entry.file_type().is_dir() {
                return None;
            }

            if entry.file_type().is_symlink() && !self.config.follow_symlinks {
                log::trace!("Skipping symlink: {}", path.display());
                return None;
            }

            let filename = entry.file_name().to_string_lossy();
            if !self.config.accepts(&filename) {
                log::trace!("Skipping non-ROM file: {}", path.display());
                return None;
            }

            // A symlink that is followed must still point at a regular file.
            if self.config.follow_symlinks && entry.file_type().is_symlink() {
                match std::fs::metadata(&path) {
                    Ok(m) if m.is_file() => {}
                    Ok(_) => return None,
                    Err(e) => return Some(self.handle_io_error(&path, e)),
                }
            }

            discovered += 1;
            if let Some(ref callback) = self.progress_callback {
                callback.on_progress(discovered, &path.to_string_lossy());
            }
            Some(Ok(RomFile::new(path)))
        })
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> Result<RomFile, ScanError> {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                Err(ScanError::PermissionDenied(path.to_path_buf()))
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been moved): {}", path.display());
                Err(ScanError::NotFound(path.to_path_buf()))
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                Err(ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                })
            }
        }
    }

    /// Handle jwalk errors.
    fn handle_jwalk_error(&self, path: PathBuf, error: jwalk::Error) -> Result<RomFile, ScanError> {
        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.io_error().map(std::io::Error::kind) {
            Some(std::io::ErrorKind::PermissionDenied) => Err(ScanError::PermissionDenied(path)),
            _ => Err(ScanError::Io {
                path,
                source: std::io::Error::other(error.to_string()),
            }),
        }
    }
}

fn is_skipped(name: &str, skip_dirs: &[String]) -> bool {
    skip_dirs.iter().any(|d| d.eq_ignore_ascii_case(name))
}
