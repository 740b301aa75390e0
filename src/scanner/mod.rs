//! Scanner module for file-set expansion and content fingerprinting.
//!
//! This module provides functionality for:
//! - Expanding glob patterns and literal paths into the tracked file set
//! - Content fingerprinting with SHA-1
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`expand`]: Pattern expansion relative to an optional base directory
//! - [`hasher`]: Streaming SHA-1 file hashing
//!
//! # Example
//!
//! ```no_run
//! use dockertimes::scanner::{expand_patterns, Fingerprint, Hasher};
//! use std::path::Path;
//!
//! let files = expand_patterns(&["dist/**".to_string()], Some(Path::new("build")))?;
//! let hasher = Hasher::new();
//! for file in files.iter().filter(|p| p.is_file()) {
//!     println!("{}: {}", file.display(), hasher.fingerprint(file)?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod expand;
pub mod hasher;

use std::path::PathBuf;

// Re-export main types
pub use expand::expand_patterns;
pub use hasher::{Fingerprint, Hasher};

/// Errors that can occur while expanding the tracked file set.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A glob pattern could not be compiled.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// The underlying glob error
        #[source]
        source: globset::Error,
    },

    /// An I/O error occurred while walking a directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}
