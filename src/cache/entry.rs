//! Cache entry definitions.

use serde::{Deserialize, Serialize};

/// The persisted record for one tracked path.
///
/// `sha1` is present only for regular files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime: i64,
    /// Hex-encoded SHA-1 of the file content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
}

impl CacheEntry {
    /// Entry for a regular file.
    #[must_use]
    pub fn file(mtime: i64, sha1: impl Into<String>) -> Self {
        Self {
            mtime,
            sha1: Some(sha1.into()),
        }
    }

    /// Entry for a directory, symlink or other non-regular path.
    #[must_use]
    pub fn path(mtime: i64) -> Self {
        Self { mtime, sha1: None }
    }
}
