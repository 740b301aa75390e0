//! Timestamp reconciliation.
//!
//! # Overview
//!
//! For every tracked path the [`Reconciler`] compares the on-disk mtime with
//! the cached one and picks exactly one [`Outcome`]:
//!
//! | Cache entry | mtime    | Kind      | Content  | Outcome                       |
//! |-------------|----------|-----------|----------|-------------------------------|
//! | missing     | -        | file      | -        | [`Outcome::CachedNewFile`]    |
//! | missing     | -        | non-file  | -        | [`Outcome::CachedNewPath`]    |
//! | present     | equal    | any       | -        | [`Outcome::Unmodified`]       |
//! | present     | differs  | non-file  | -        | [`Outcome::Restored`]         |
//! | present     | differs  | file      | same     | [`Outcome::Restored`]         |
//! | present     | differs  | file      | changed  | [`Outcome::CachedModified`]   |
//!
//! Content is only fingerprinted when a regular file is first seen or when its
//! mtime has drifted. Restoring rewrites the modification time only; the
//! cache entry is left unchanged.

pub mod mtime;
pub mod reconciler;

use std::fmt;
use std::path::PathBuf;

use crate::scanner::HashError;

pub use mtime::{from_millis, to_millis};
pub use reconciler::Reconciler;

/// The action taken for one tracked path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A regular file was seen for the first time and recorded.
    CachedNewFile {
        /// Tracked path
        path: PathBuf,
        /// Recorded mtime (ms)
        mtime: i64,
        /// Recorded content hash
        sha1: String,
    },
    /// A directory or other non-regular path was seen for the first time.
    CachedNewPath {
        /// Tracked path
        path: PathBuf,
        /// Recorded mtime (ms)
        mtime: i64,
    },
    /// The on-disk mtime matched the cache; nothing was read or written.
    Unmodified {
        /// Tracked path
        path: PathBuf,
    },
    /// The on-disk mtime was rewritten to the cached value.
    Restored {
        /// Tracked path
        path: PathBuf,
        /// The cached mtime now on disk (ms)
        mtime: i64,
        /// Whether the path is a regular file
        is_file: bool,
    },
    /// File content changed; the cache now records the new mtime and hash.
    CachedModified {
        /// Tracked path
        path: PathBuf,
        /// New baseline mtime (ms)
        mtime: i64,
        /// New content hash
        sha1: String,
    },
}

impl Outcome {
    /// Log level for this outcome. Unmodified paths are debug, every change
    /// to the disk or the cache is info.
    #[must_use]
    pub fn level(&self) -> log::Level {
        match self {
            Self::Unmodified { .. } => log::Level::Debug,
            _ => log::Level::Info,
        }
    }

    pub(crate) fn log(&self) {
        log::log!(self.level(), "{}", self);
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CachedNewFile { path, mtime, sha1 } => write!(
                f,
                "Cached new file {} with sha1 {} and mtime {}",
                path.display(),
                sha1,
                mtime
            ),
            Self::CachedNewPath { path, mtime } => {
                write!(f, "Cached new path {} with mtime {}", path.display(), mtime)
            }
            Self::Unmodified { path } => write!(f, "Unmodified timestamp for {}", path.display()),
            Self::Restored {
                path,
                mtime,
                is_file,
            } => write!(
                f,
                "Restored {} {} to mtime {}",
                if *is_file { "file" } else { "path" },
                path.display(),
                mtime
            ),
            Self::CachedModified { path, mtime, sha1 } => write!(
                f,
                "Cached modified file {} with sha1 {} and mtime {}",
                path.display(),
                sha1,
                mtime
            ),
        }
    }
}

/// Errors that abort reconciliation of a path.
#[derive(thiserror::Error, Debug)]
pub enum ReconcileError {
    /// The path could not be stat'ed.
    #[error("Failed to stat {path}: {source}")]
    Stat {
        /// Tracked path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The path cannot be stored as a cache key.
    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// The file content could not be read for hashing.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// The cached mtime could not be written back.
    #[error("Failed to restore mtime of {path}: {source}")]
    Restore {
        /// Tracked path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
