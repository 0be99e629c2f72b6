//! Scanner module for file discovery and read access.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Scoped memory-mapped reads of candidate files
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`reader`]: Read-only memory mapping of one file at a time
//!
//! # Example
//!
//! ```no_run
//! use neardupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     min_size: Some(1024),  // Skip files under 1KB
//!     skip_hidden: true,     // Skip hidden files
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod reader;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use reader::with_mapped;
pub use walker::{dedupe_roots, Walker};

/// A candidate file discovered by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file as discovered
    pub path: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
    /// Whether this file was reached through a symbolic link
    pub is_symlink: bool,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            is_symlink: false,
        }
    }
}

/// Configuration for directory walking.
///
/// Controls filtering, symlink handling, and other walk behavior.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Warning: May cause infinite loops with symlink cycles.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// Glob patterns to ignore (gitignore-style).
    /// These are applied in addition to any .gitignore files.
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(
        follow_symlinks: bool,
        skip_hidden: bool,
        min_size: Option<u64>,
        max_size: Option<u64>,
        ignore_patterns: Vec<String>,
    ) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
            min_size,
            max_size,
            ignore_patterns,
        }
    }

    /// Check if a file size passes the min/max filters.
    #[must_use]
    pub fn passes_size_filter(&self, size: u64) -> bool {
        self.min_size.map_or(true, |min| size >= min)
            && self.max_size.map_or(true, |max| size <= max)
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

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A candidate file could not be read.
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Errors that can occur while opening or mapping a file.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The specified file was not found.
    #[error("Error opening file {0}: not found")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Error opening file {0}: permission denied")]
    PermissionDenied(PathBuf),

    /// The file's metadata could not be read.
    #[error("Error statting file {path}: {source}")]
    Stat {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file could not be memory-mapped.
    #[error("Error mapping file {path}: {source}")]
    Map {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ReadError {
    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) => path,
            Self::Stat { path, .. } | Self::Map { path, .. } | Self::Io { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_new() {
        let entry = FileEntry::new(PathBuf::from("/test/file.txt"), 1024);

        assert_eq!(entry.path, PathBuf::from("/test/file.txt"));
        assert_eq!(entry.size, 1024);
        assert!(!entry.is_symlink);
    }

    #[test]
    fn test_walker_config_default() {
        let config = WalkerConfig::default();

        assert!(!config.follow_symlinks);
        assert!(!config.skip_hidden);
        assert!(config.min_size.is_none());
        assert!(config.max_size.is_none());
        assert!(config.ignore_patterns.is_empty());
    }

    #[test]
    fn test_walker_config_size_filter() {
        let config = WalkerConfig::new(false, false, Some(10), Some(100), Vec::new());

        assert!(!config.passes_size_filter(9));
        assert!(config.passes_size_filter(10));
        assert!(config.passes_size_filter(100));
        assert!(!config.passes_size_filter(101));
        assert!(WalkerConfig::default().passes_size_filter(u64::MAX));
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::PermissionDenied(PathBuf::from("/test"));
        assert_eq!(err.to_string(), "Permission denied: /test");

        let err = ScanError::NotFound(PathBuf::from("/missing"));
        assert_eq!(err.to_string(), "Path not found: /missing");
    }

    #[test]
    fn test_read_error_display_and_path() {
        let err = ReadError::NotFound(PathBuf::from("/gone.bin"));
        assert_eq!(err.to_string(), "Error opening file /gone.bin: not found");
        assert_eq!(err.path(), std::path::Path::new("/gone.bin"));

        let err = ReadError::Map {
            path: PathBuf::from("/odd.bin"),
            source: std::io::Error::other("boom"),
        };
        assert_eq!(err.to_string(), "Error mapping file /odd.bin: boom");
        assert_eq!(err.path(), std::path::Path::new("/odd.bin"));
    }
}
