//! In-memory cache store with JSON persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::CacheEntry;

/// Cache file used when no other path is configured.
pub const DEFAULT_CACHE_FILE: &str = ".dockertimes.json";

/// Errors raised while persisting the cache.
///
/// Loading never fails; see [`CacheStore::load_or_default`].
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The cache could not be serialized.
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The cache file could not be written.
    #[error("Failed to write cache file {path}: {source}")]
    Io {
        /// Cache file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Mapping from tracked path to its [`CacheEntry`].
///
/// Keys are the exact path strings used for lookups. Entries are kept
/// sorted so an unchanged cache serializes to identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStore {
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from `path`, falling back to an empty store.
    ///
    /// A missing, unreadable, empty or malformed cache file all produce an
    /// empty store. The failure is only visible at debug level.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("No cache loaded from {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json(&bytes) {
            Ok(store) => {
                log::debug!("Loaded {} cache entries from {}", store.len(), path.display());
                store
            }
            Err(e) => {
                log::debug!("Ignoring unreadable cache {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse a store from its JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns the decode error when `bytes` is not a JSON object of entries.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let entries = serde_json::from_slice(bytes)?;
        Ok(Self { entries })
    }

    /// Serialize the store as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError::Serialize`] if encoding fails.
    pub fn to_json(&self) -> Result<String, CacheError> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Write the store to `path`, replacing any previous content.
    ///
    /// Parent directories are not created.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if encoding or writing fails.
    pub fn persist(&self, path: &Path) -> Result<(), CacheError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Wrote {} cache entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Look up the entry for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Number of tracked paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
