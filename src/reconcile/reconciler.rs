//! Per-path reconciliation against the shared cache store.

use std::fs::{self, Metadata};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use filetime::FileTime;

use super::mtime::{from_millis, to_millis};
use super::{Outcome, ReconcileError};
use crate::cache::{CacheEntry, CacheStore};
use crate::scanner::{Fingerprint, Hasher};

/// Decides and applies the [`Outcome`] for each tracked path.
///
/// The store is shared between worker threads. Its lock is held only for the
/// lookup and for the write-back; stat, hashing and timestamp writes happen
/// outside it.
#[derive(Debug, Clone, Default)]
pub struct Reconciler<F = Hasher> {
    fingerprinter: F,
}

impl Reconciler<Hasher> {
    /// Create a reconciler using the default SHA-1 [`Hasher`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_fingerprinter(Hasher::new())
    }
}

impl<F: Fingerprint> Reconciler<F> {
    /// Create a reconciler with a custom fingerprinter.
    #[must_use]
    pub fn with_fingerprinter(fingerprinter: F) -> Self {
        Self { fingerprinter }
    }

    /// The fingerprinter in use.
    #[must_use]
    pub fn fingerprinter(&self) -> &F {
        &self.fingerprinter
    }

    /// Reconcile one path against `store`.
    ///
    /// The path's string form is the cache key, so it must be valid UTF-8.
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be stat'ed or is not valid UTF-8, if a
    /// regular file cannot be read for hashing, or if a restored mtime cannot
    /// be written.
    pub fn reconcile(
        &self,
        path: &Path,
        store: &Mutex<CacheStore>,
    ) -> Result<Outcome, ReconcileError> {
        let metadata = fs::symlink_metadata(path).map_err(|source| ReconcileError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        let mtime = to_millis(FileTime::from_last_modification_time(&metadata));
        let is_file = metadata.is_file();
        let key = path
            .to_str()
            .ok_or_else(|| ReconcileError::NonUtf8Path(path.to_path_buf()))?
            .to_owned();

        let cached = lock(store).get(&key).cloned();

        let outcome = match cached {
            None if is_file => {
                let sha1 = self.fingerprinter.fingerprint(path)?;
                lock(store).insert(key, CacheEntry::file(mtime, sha1.clone()));
                Outcome::CachedNewFile {
                    path: path.to_path_buf(),
                    mtime,
                    sha1,
                }
            }
            None => {
                lock(store).insert(key, CacheEntry::path(mtime));
                Outcome::CachedNewPath {
                    path: path.to_path_buf(),
                    mtime,
                }
            }
            Some(entry) if entry.mtime == mtime => Outcome::Unmodified {
                path: path.to_path_buf(),
            },
            Some(entry) if !is_file => {
                restore_mtime(path, &metadata, entry.mtime)?;
                Outcome::Restored {
                    path: path.to_path_buf(),
                    mtime: entry.mtime,
                    is_file,
                }
            }
            Some(entry) => {
                let sha1 = self.fingerprinter.fingerprint(path)?;
                if entry.sha1.as_deref() == Some(sha1.as_str()) {
                    restore_mtime(path, &metadata, entry.mtime)?;
                    Outcome::Restored {
                        path: path.to_path_buf(),
                        mtime: entry.mtime,
                        is_file,
                    }
                } else {
                    lock(store).insert(key, CacheEntry::file(mtime, sha1.clone()));
                    Outcome::CachedModified {
                        path: path.to_path_buf(),
                        mtime,
                        sha1,
                    }
                }
            }
        };

        outcome.log();
        Ok(outcome)
    }
}

/// Rewrite the modification time of `path`, keeping the access time from
/// `metadata`. Symbolic links are updated themselves, not their targets.
fn restore_mtime(path: &Path, metadata: &Metadata, mtime: i64) -> Result<(), ReconcileError> {
    let atime = FileTime::from_last_access_time(metadata);
    let mtime = from_millis(mtime);

    let result = if metadata.file_type().is_symlink() {
        filetime::set_symlink_file_times(path, atime, mtime)
    } else {
        filetime::set_file_times(path, atime, mtime)
    };

    result.map_err(|source| ReconcileError::Restore {
        path: path.to_path_buf(),
        source,
    })
}

/// Entries are replaced whole, so a poisoned store is still consistent.
fn lock(store: &Mutex<CacheStore>) -> MutexGuard<'_, CacheStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
